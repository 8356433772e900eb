//! HTTP/SSE API
//!
//! REST endpoints for enqueueing work, session and feedback management, plus
//! the per-request SSE stream.

pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{create_router, AppState};
