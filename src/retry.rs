use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Bounded retry with exponential backoff around one upstream call.
///
/// Only transient failures (timeouts, connect errors, 5xx) are retried;
/// client errors and local validation surface immediately. After the final
/// attempt the last error is returned unchanged.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Cap on a single backoff sleep.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(crate::config::RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(crate::config::RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient upstream failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::RiskError;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn first_success_makes_one_attempt() {
        let attempts = AtomicU32::new(0);
        let result = fast_policy(3)
            .execute(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(42u32)
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_until_success() {
        let attempts = AtomicU32::new(0);
        let result = fast_policy(3)
            .execute(|| async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(RiskError::UpstreamStatus { provider: "crime provider", status: 500 })
                } else {
                    Ok("ok")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn persistent_5xx_exhausts_budget_and_surfaces_last_error() {
        let attempts = AtomicU32::new(0);
        let result: crate::error::Result<()> = fast_policy(3)
            .execute(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RiskError::UpstreamStatus { provider: "flood provider", status: 502 })
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        match result {
            Err(RiskError::UpstreamStatus { provider, status }) => {
                assert_eq!(provider, "flood provider");
                assert_eq!(status, 502);
            }
            other => panic!("expected UpstreamStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_error_is_never_retried() {
        let attempts = AtomicU32::new(0);
        let result: crate::error::Result<()> = fast_policy(5)
            .execute(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RiskError::UpstreamStatus { provider: "crime provider", status: 404 })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_and_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(4), Duration::from_millis(350));
    }
}
