//! Bounded retry with capped exponential backoff.
//!
//! Only [`AiLlmError::is_retryable`] failures are retried. When the budget is
//! exhausted the last transient error is folded into [`AiLlmError::Unavailable`],
//! so callers see one distinct "LLM unavailable" kind.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error_handler::{AiLlmError, Result};

/// Retry budget for one logical LLM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after the failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// `on_retry` is invoked once per scheduled retry (used for usage stats).
    pub async fn run<T, F, Fut, R>(&self, label: &'static str, mut op: F, mut on_retry: R) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        R: FnMut(),
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt < max => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        op = label,
                        attempt,
                        max_attempts = max,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient LLM failure; retrying"
                    );
                    on_retry();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    return Err(AiLlmError::Unavailable {
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::ConfigError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts: attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_after(1), Duration::from_millis(500));
        assert_eq!(p.delay_after(2), Duration::from_millis(1000));
        assert_eq!(p.delay_after(3), Duration::from_millis(2000));
        assert_eq!(p.delay_after(4), Duration::from_secs(4));
        assert_eq!(p.delay_after(40), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn transient_errors_exhaust_into_unavailable() {
        let calls = AtomicU32::new(0);
        let mut retries = 0;
        let out: Result<()> = fast(3)
            .run(
                "test",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(AiLlmError::Timeout(Duration::from_secs(1))) }
                },
                || retries += 1,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries, 2);
        assert!(matches!(out, Err(AiLlmError::Unavailable { attempts: 3, .. })));
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let out: Result<()> = fast(3)
            .run(
                "test",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(ConfigError::EmptyModel.into()) }
                },
                || {},
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(out, Err(AiLlmError::Config(_))));
    }

    #[tokio::test]
    async fn recovers_after_one_transient_failure() {
        let calls = AtomicU32::new(0);
        let out = fast(3)
            .run(
                "test",
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(AiLlmError::Timeout(Duration::from_secs(1)))
                        } else {
                            Ok("done")
                        }
                    }
                },
                || {},
            )
            .await
            .unwrap();
        assert_eq!(out, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
