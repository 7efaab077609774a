// Short retry loop for the OAuth token exchange

use backoff::{backoff::Backoff, ExponentialBackoff};
use std::time::Duration;
use tracing::debug;

/// Backoff schedule for token-endpoint calls. Deliberately short: a
/// refresh that fails three times drops the credential from the batch
/// rather than stalling the whole load.
pub fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(500),
        initial_interval: Duration::from_millis(500),
        randomization_factor: 0.3,
        multiplier: 2.0,
        max_interval: Duration::from_secs(5),
        max_elapsed_time: Some(Duration::from_secs(15)),
        ..Default::default()
    }
}

/// Determine if an HTTP status code is worth retrying.
pub fn is_retryable(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Execute `operation` with exponential backoff on retryable failures.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, (u16, String)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, (u16, String)>>,
{
    let mut backoff = create_backoff();
    let mut attempt = 0;
    const MAX_ATTEMPTS: u32 = 3;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err((status, error_body)) => {
                if !is_retryable(status) || attempt >= MAX_ATTEMPTS {
                    return Err((status, error_body));
                }

                let delay = backoff.next_backoff().unwrap_or(Duration::from_secs(5));
                debug!(
                    "{} failed with {} (attempt {}), retrying after {}ms",
                    operation_name,
                    status,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(429));
        assert!(is_retryable(500));
        assert!(is_retryable(502));
        assert!(is_retryable(503));
        assert!(!is_retryable(400));
        assert!(!is_retryable(404));
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let mut calls = 0;
        let result: Result<(), _> = with_retry("test", || {
            calls += 1;
            async { Err((401, "unauthorized".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
