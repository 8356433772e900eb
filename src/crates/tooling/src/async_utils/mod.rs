//! Async utilities for retry and timeout handling

pub mod retry;
pub mod timeout;

pub use retry::{with_retry, RetryPolicy};
pub use timeout::{with_timeout, TimeoutError};
