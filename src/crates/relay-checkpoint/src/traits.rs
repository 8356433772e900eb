//! Storage trait for checkpoint backends
//!
//! Implementations must be `Send + Sync` and safe under concurrent access
//! from multiple workers. Backends map onto four storage operations: put,
//! get-latest-by-session, list-by-session-since and delete-by-session.

use crate::checkpoint::{Checkpoint, SessionIndex};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Checkpoint storage backend
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist a checkpoint atomically
    ///
    /// The write must be rejected with
    /// [`CheckpointError::StaleSequence`](crate::error::CheckpointError::StaleSequence)
    /// when a checkpoint with an equal or newer sequence already exists for
    /// the session. Returns the stored sequence on success.
    async fn put(&self, checkpoint: Checkpoint) -> Result<u64>;

    /// Most recent checkpoint for a session, or `None` for unknown sessions
    async fn latest(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    /// Session index documents, newest first
    ///
    /// `since` filters out sessions not updated after the given instant;
    /// `limit` caps the result size.
    async fn list_sessions(
        &self,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<SessionIndex>>;

    /// Remove every checkpoint and index document for a session
    ///
    /// Idempotent: deleting an unknown session succeeds.
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Whether the backing store is reachable
    async fn is_available(&self) -> bool {
        true
    }
}
