//! Checkpoint and session index data structures

use chrono::{DateTime, Utc};
use relay_core::AgentState;
use serde::{Deserialize, Serialize};

/// Maximum characters of summary copied into a session index document
pub const INDEX_SUMMARY_MAX_CHARS: usize = 160;

/// A persisted snapshot of a session's agent state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Session the snapshot belongs to
    pub session_id: String,
    /// Monotonic sequence within the session
    pub sequence: u64,
    /// Full agent state at the time of the snapshot
    pub state: AgentState,
    /// Write timestamp
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Create a checkpoint timestamped now
    pub fn new(session_id: impl Into<String>, sequence: u64, state: AgentState) -> Self {
        Self {
            session_id: session_id.into(),
            sequence,
            state,
            created_at: Utc::now(),
        }
    }
}

/// Lightweight per-session document used for fast listing
///
/// Maintained alongside checkpoints on every write so that session listings
/// never deserialize full state bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIndex {
    /// Session identifier
    pub session_id: String,
    /// Truncated summary for display
    pub summary: String,
    /// Timestamp of the latest checkpoint
    pub last_updated: DateTime<Utc>,
}

impl SessionIndex {
    /// Build the index document for a checkpoint
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Self {
        Self {
            session_id: checkpoint.session_id.clone(),
            summary: truncate_chars(&checkpoint.state.summary, INDEX_SUMMARY_MAX_CHARS),
            last_updated: checkpoint.created_at,
        }
    }
}

/// Truncate a string to at most `max` characters on a char boundary
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}
