//! Retry-with-backoff wrapper shared by every external call site: vision,
//! knowledge, reasoning, and the persistence conditional write.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use reloom_core::config::PipelineConfig;

/// Classifies an error as worth another attempt. Anything non-transient
/// propagates out of the executor immediately.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Exponential backoff schedule: `base_delay * multiplier^(attempt - 2)`
/// before the attempt numbered `attempt`. No delay before the first attempt.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1), multiplier: 2 }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_secs(config.retry_base_delay_secs),
            multiplier: config.retry_backoff_multiplier.max(1),
        }
    }

    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * self.multiplier.saturating_pow(attempt.saturating_sub(2))
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RetryError<E: std::fmt::Debug + std::fmt::Display> {
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    Exhausted { operation: String, attempts: u32, last_error: E },
    #[error("{operation} failed: {error}")]
    Fatal { operation: String, error: E },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Runs `call` until it succeeds, fails fatally, or exhausts the attempt
    /// budget. Transient errors sleep out the backoff schedule between
    /// attempts; any other error propagates immediately.
    pub async fn execute<T, E, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, RetryError<E>>
    where
        E: Retryable + std::fmt::Debug + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_transient() => {
                    return Err(RetryError::Fatal { operation: operation.to_string(), error });
                }
                Err(error) if attempt >= self.policy.max_attempts => {
                    return Err(RetryError::Exhausted {
                        operation: operation.to_string(),
                        attempts: attempt,
                        last_error: error,
                    });
                }
                Err(error) => {
                    attempt += 1;
                    let delay = self.policy.delay_before(attempt);
                    warn!(
                        event_name = "pipeline.retry_scheduled",
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient failure, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tokio::time::Instant;

    use crate::adapters::AdapterError;

    use super::{RetryError, RetryExecutor, RetryPolicy};

    fn transient() -> AdapterError {
        AdapterError::Transport { service: "vision", reason: "connection reset".to_string() }
    }

    #[test]
    fn backoff_schedule_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(2), Duration::from_secs(1));
        assert_eq!(policy.delay_before(3), Duration::from_secs(2));
        assert_eq!(policy.delay_before(4), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn first_success_needs_no_sleep() {
        let executor = RetryExecutor::default();
        let calls = AtomicU32::new(0);

        let value = executor
            .execute("vision.detect", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AdapterError>(7) }
            })
            .await
            .expect("succeeds");

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_consume_the_full_attempt_budget() {
        let executor = RetryExecutor::default();
        let calls = AtomicU32::new(0);
        let attempt_times = std::sync::Mutex::new(Vec::new());

        let error = executor
            .execute("vision.detect", || {
                calls.fetch_add(1, Ordering::SeqCst);
                attempt_times.lock().expect("lock").push(Instant::now());
                async { Err::<(), _>(transient()) }
            })
            .await
            .expect_err("must exhaust");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(error, RetryError::Exhausted { attempts: 3, .. }));

        let times = attempt_times.lock().expect("lock");
        assert_eq!(times[1] - times[0], Duration::from_secs(1));
        assert_eq!(times[2] - times[1], Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_when_a_later_attempt_succeeds() {
        let executor = RetryExecutor::default();
        let calls = AtomicU32::new(0);

        let value = executor
            .execute("knowledge.retrieve_trends", || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt < 3 {
                        Err(transient())
                    } else {
                        Ok("snapshot")
                    }
                }
            })
            .await
            .expect("third attempt succeeds");

        assert_eq!(value, "snapshot");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_short_circuit_without_retrying() {
        let executor = RetryExecutor::default();
        let calls = AtomicU32::new(0);

        let error = executor
            .execute("reasoning.explain", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(AdapterError::Malformed {
                        service: "reasoning",
                        reason: "not JSON".to_string(),
                    })
                }
            })
            .await
            .expect_err("must be fatal");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(error, RetryError::Fatal { .. }));
    }
}
