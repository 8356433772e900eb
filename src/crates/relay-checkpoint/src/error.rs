//! Error types for checkpoint storage

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur in checkpoint storage
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// A write carried a sequence not newer than the stored one
    #[error(
        "Stale checkpoint for session {session_id}: attempted sequence {attempted}, latest is {latest}"
    )]
    StaleSequence {
        /// Session being written
        session_id: String,
        /// Sequence of the rejected write
        attempted: u64,
        /// Sequence currently stored
        latest: u64,
    },

    /// Invalid input (empty session id, etc.)
    #[error("Invalid checkpoint: {0}")]
    Invalid(String),

    /// Checkpoint body could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store failed
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl CheckpointError {
    /// Whether the write lost a sequence race rather than hitting a fault
    pub fn is_conflict(&self) -> bool {
        matches!(self, CheckpointError::StaleSequence { .. })
    }
}
