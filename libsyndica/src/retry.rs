//! Bounded exponential-backoff retry for remote publish calls
//!
//! Only errors classified retryable ([`SyndicaError::is_retryable`]) are
//! attempted again; validation and fatal remote rejections surface on the
//! first attempt. Delays are computed by a pure function so backoff schedules
//! are testable without sleeping.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RetrySection;
use crate::error::{Result, SyndicaError};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Must be at least 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_multiplier: 2.0,
        }
    }
}

impl From<&RetrySection> for RetryPolicy {
    fn from(section: &RetrySection) -> Self {
        Self {
            max_attempts: section.max_attempts.max(1),
            initial_delay: Duration::from_millis(section.initial_delay_ms),
            max_delay: Duration::from_millis(section.max_delay_ms),
            backoff_multiplier: section.backoff_multiplier,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1 = the delay after the first
    /// failure): `initial * multiplier^(attempt-1)`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exp as i32);
        let capped = ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Run `op` until it succeeds, fails non-retryably, or exhausts the
    /// attempt budget. The last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_collecting(label, &mut op).await.map(|o| o.value)
    }

    /// Like [`run`](Self::run) but reports how many attempts were spent.
    pub async fn run_collecting<T, F, Fut>(&self, label: &str, op: &mut F) -> Result<RetryOutcome<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(RetryOutcome { value, attempts: attempt }),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{label}: attempt {attempt}/{max_attempts} failed ({e}), retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        debug!("{label}: attempt budget exhausted after {attempt} attempts");
                    } else {
                        debug!("{label}: non-retryable error on attempt {attempt}: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// A successful result plus the number of attempts it cost.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
}

/// Convenience wrapper for call sites that only have a fallible future once.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    policy.run(label, op).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            backoff_multiplier: 2.0,
        }
    }

    fn transient() -> SyndicaError {
        PlatformError::Transient("503 Service Unavailable".to_string()).into()
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_caps_at_max_delay() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(5000));
        assert_eq!(policy.delay_for(9), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let outcome = policy
            .run_collecting("test", &mut move || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome.value, 42);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let outcome = policy
            .run_collecting("test", &mut move || {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(transient())
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome.value, "ok");
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempt_budget() {
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: Result<()> = policy
            .run("test", move || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let policy = fast_policy(5);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: Result<()> = policy
            .run("test", move || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(PlatformError::Fatal("401 Unauthorized".to_string()).into())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1, "fatal errors get exactly one attempt");
    }

    #[tokio::test]
    async fn test_validation_error_not_retried() {
        let policy = fast_policy(5);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: Result<()> = policy
            .run("test", move || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(PlatformError::Validation("too long".to_string()).into())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_is_retried() {
        let policy = fast_policy(2);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: Result<()> = policy
            .run("test", move || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(PlatformError::RateLimited {
                        message: "twitter:acct".to_string(),
                        retry_after: Some(Duration::from_millis(1)),
                    }
                    .into())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_policy_from_config_section() {
        let section = RetrySection {
            max_attempts: 0,
            initial_delay_ms: 50,
            max_delay_ms: 200,
            backoff_multiplier: 3.0,
        };
        let policy = RetryPolicy::from(&section);
        // Zero attempts is nonsensical, clamped to one
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.initial_delay, Duration::from_millis(50));
        assert_eq!(policy.backoff_multiplier, 3.0);
    }
}
