//! Timeout utilities for async operations

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;

/// Execute an async operation with a timeout
///
/// Returns the operation result, or `TimeoutError::Timeout` if the duration elapsed first.
pub async fn with_timeout<F, T, E>(
    duration: Duration,
    operation: F,
) -> std::result::Result<T, TimeoutError<E>>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    match tokio_timeout(duration, operation).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(error)) => Err(TimeoutError::OperationFailed(error)),
        Err(_elapsed) => Err(TimeoutError::Timeout(duration)),
    }
}

/// Error type for timeout operations
#[derive(Debug)]
pub enum TimeoutError<E> {
    /// Operation completed but failed
    OperationFailed(E),
    /// Operation timed out
    Timeout(Duration),
}

impl<E> TimeoutError<E> {
    /// Whether the failure was the timeout itself rather than the operation
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutError::Timeout(_))
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutError::OperationFailed(e) => write!(f, "Operation failed: {}", e),
            TimeoutError::Timeout(d) => write!(f, "Operation timed out after {:?}", d),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimeoutError::OperationFailed(e) => Some(e),
            TimeoutError::Timeout(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_operation_completes_in_time() {
        let result: Result<i32, TimeoutError<String>> =
            with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert!(matches!(result, Ok(7)));
    }

    #[tokio::test]
    async fn test_operation_times_out() {
        let result: Result<(), TimeoutError<String>> =
            with_timeout(Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        match result {
            Err(e) => assert!(e.is_timeout()),
            Ok(_) => panic!("expected timeout"),
        }
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: Result<(), TimeoutError<String>> =
            with_timeout(Duration::from_secs(1), async { Err("boom".to_string()) }).await;

        match result {
            Err(TimeoutError::OperationFailed(msg)) => assert_eq!(msg, "boom"),
            _ => panic!("expected operation failure"),
        }
    }
}
