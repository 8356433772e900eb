//! Async utilities and helpers shared across the relay workspace
//!
//! # Modules
//!
//! - `config` - Environment variable loading with typed parsing
//! - `async_utils` - Retry policies and timeout utilities for async operations
//! - `logging` - Tracing subscriber initialization and timing helpers

pub mod async_utils;
pub mod config;
pub mod logging;

use thiserror::Error;

/// Errors that can occur in the tooling crate
#[derive(Debug, Error)]
pub enum ToolingError {
    /// General error with message
    #[error("Tooling error: {0}")]
    General(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tooling operations
pub type Result<T> = std::result::Result<T, ToolingError>;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
