//! Timeout-with-fallback, the system's only form of cancellation.
//!
//! A slow or failing provider call is abandoned from the caller's
//! perspective and its documented fallback value substituted; nothing is
//! retried and no error escapes.

use std::future::Future;
use std::time::Duration;

use crate::error::MarketDataError;

/// Awaits `operation` for at most `timeout`, resolving to `fallback` on
/// timeout or error.
pub async fn fetch_with_fallback<T, F>(
    label: &str,
    operation: F,
    fallback: T,
    timeout: Duration,
) -> T
where
    F: Future<Output = Result<T, MarketDataError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            tracing::warn!(provider = label, error = %err, "provider call failed, using fallback");
            fallback
        }
        Err(_) => {
            tracing::warn!(
                provider = label,
                timeout_ms = timeout.as_millis() as u64,
                "provider call timed out, using fallback"
            );
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_successful_results() {
        let value =
            fetch_with_fallback("test", async { Ok(7) }, 0, Duration::from_millis(50)).await;
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn substitutes_fallback_on_error() {
        let op = async { Err::<i32, _>(MarketDataError::Api("boom".to_string())) };
        let value = fetch_with_fallback("test", op, 9, Duration::from_millis(50)).await;
        assert_eq!(value, 9);
    }

    #[tokio::test]
    async fn substitutes_fallback_on_timeout() {
        let op = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        };
        let value = fetch_with_fallback("test", op, 3, Duration::from_millis(10)).await;
        assert_eq!(value, 3);
    }
}
