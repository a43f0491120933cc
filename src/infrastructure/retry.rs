//! Exponential backoff for individual provider calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::config::http::RetryConfig;
use crate::error::ProviderError;

/// Run `op` until it succeeds, fails permanently, or attempts run out.
///
/// Only errors reporting [`ProviderError::is_retryable`] are retried. The
/// delay grows by `backoff_multiplier` up to `max_delay_ms`, plus up to 20%
/// jitter.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay_ms = config.initial_delay_ms;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && err.is_retryable() => {
                let delay = Duration::from_millis(delay_ms + jitter_ms(delay_ms));
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Provider call failed, retrying"
                );
                tokio::time::sleep(delay).await;

                let next = (delay_ms as f64 * config.backoff_multiplier) as u64;
                delay_ms = next.min(config.max_delay_ms);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn jitter_ms(base_ms: u64) -> u64 {
    let range = base_ms / 5;
    if range == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 4,
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&fast(3), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ProviderError::Timeout("slow".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(&fast(2), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Connect("refused".into()))
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Connect(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(&fast(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::InvalidAddress("zz".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _ = retry_with_backoff(&fast(0), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ProviderError>(())
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn jitter_is_bounded() {
        assert_eq!(jitter_ms(4), 0);
        for _ in 0..100 {
            assert!(jitter_ms(1000) <= 200);
        }
    }
}
