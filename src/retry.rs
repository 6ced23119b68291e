//! Exponential-backoff executor for gateway calls.
//!
//! Transient failures (timeouts, 5xx, rate limits) are retried with
//! exponential backoff and jitter up to a capped attempt count; permanent
//! failures are surfaced immediately. A `Retry-After` hint from the venue
//! overrides the computed delay. The caller-supplied cancellation token is
//! checked before every attempt, so a pre-cancelled call issues zero
//! gateway requests.

use std::future::Future;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ErrorKind, GatewayError};

/// Backoff configuration for one class of gateway calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first call.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Run a gateway operation under this policy.
    ///
    /// On exhaustion the final transient error is wrapped with the attempt
    /// count and total elapsed time; permanent errors pass through unmodified
    /// as [`ClientError::Venue`].
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => match err.kind() {
                    ErrorKind::Permanent => return Err(ClientError::Venue(err)),
                    ErrorKind::Transient => {
                        attempt += 1;
                        if attempt >= self.max_attempts {
                            return Err(ClientError::Network {
                                attempts: attempt,
                                elapsed: started.elapsed(),
                                source: err,
                            });
                        }

                        let delay = err
                            .retry_after()
                            .unwrap_or_else(|| self.backoff_delay(attempt - 1));
                        tracing::warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Transient gateway failure, backing off"
                        );

                        tokio::select! {
                            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                },
            }
        }
    }

    /// Delay before the retry following failed attempt number `attempt`
    /// (zero-based): `min(max_delay, base * multiplier^attempt) + jitter`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped_ms = (scaled as u64).min(self.max_delay.as_millis() as u64);
        let capped = Duration::from_millis(capped_ms);
        capped + Duration::from_millis(jitter_ms(capped))
    }
}

/// Up to 20% random jitter so synchronized callers do not retry in lockstep.
fn jitter_ms(base: Duration) -> u64 {
    let range_ms = (base.as_millis() as u64) / 5;
    if range_ms == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as u64) % (range_ms + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let policy = fast_policy();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result = policy
            .execute(&cancel, move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, GatewayError>(42u32)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let policy = fast_policy();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result = policy
            .execute(&cancel, move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(GatewayError::Timeout("slow".into()))
                    } else {
                        Ok(7u32)
                    }
                }
            })
            .await;

        // Fails twice, succeeds on attempt three.
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_wraps_final_error() {
        let policy = fast_policy();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result: Result<u32, _> = policy
            .execute(&cancel, move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(GatewayError::Status {
                        status: 503,
                        message: "unavailable".into(),
                    })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result.unwrap_err() {
            ClientError::Network { attempts, source, .. } => {
                assert_eq!(attempts, 4);
                assert!(matches!(source, GatewayError::Status { status: 503, .. }));
            }
            other => panic!("expected Network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_permanent_error_fails_immediately() {
        let policy = fast_policy();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result: Result<u32, _> = policy
            .execute(&cancel, move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(GatewayError::Status {
                        status: 400,
                        message: "bad request".into(),
                    })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err(), ClientError::Venue(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let policy = fast_policy();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result: Result<u32, _> = policy
            .execute(&cancel, move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(1u32)
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(result.unwrap_err(), ClientError::Cancelled));
    }

    #[test]
    fn test_backoff_delays_non_decreasing_until_cap() {
        let policy = RetryPolicy {
            max_attempts: 8,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(500),
        };

        let assert_in_range = |delay: Duration, base_ms: u64| {
            let max_ms = base_ms + base_ms / 5;
            let delay_ms = delay.as_millis() as u64;
            assert!(
                (base_ms..=max_ms).contains(&delay_ms),
                "delay {delay_ms}ms not within {base_ms}..={max_ms}ms"
            );
        };

        assert_in_range(policy.backoff_delay(0), 100);
        assert_in_range(policy.backoff_delay(1), 200);
        assert_in_range(policy.backoff_delay(2), 400);
        assert_in_range(policy.backoff_delay(3), 500); // capped
        assert_in_range(policy.backoff_delay(10), 500); // stays capped
    }

    #[test]
    fn test_zero_base_delay_has_zero_jitter() {
        assert_eq!(jitter_ms(Duration::from_millis(0)), 0);
    }

    #[tokio::test]
    async fn test_retry_after_hint_is_respected() {
        let policy = RetryPolicy {
            max_attempts: 3,
            // A large base delay that would dominate the test runtime if the
            // hint were ignored.
            base_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        };
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let started = Instant::now();
        let result = policy
            .execute(&cancel, move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err(GatewayError::RateLimited {
                            retry_after: Some(Duration::from_millis(5)),
                        })
                    } else {
                        Ok(1u32)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
