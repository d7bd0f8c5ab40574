//! Retry utilities for calls to external services.
//!
//! Provides bounded retry with exponential backoff. The backoff schedule is a
//! pure function of the attempt index so callers can reason about (and test)
//! the exact wait sequence.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff duration before the first retry.
    pub initial_backoff: Duration,
    /// Backoff multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Same policy with a different attempt ceiling.
    pub fn with_max_attempts(&self, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..self.clone()
        }
    }

    /// Backoff to wait after `attempt` failed attempts (1-based), before the
    /// next attempt is issued. Pure: 1s, 2s, 4s, ... for the default policy.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let backoff = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let backoff_ms = backoff.min(self.max_backoff.as_millis() as f64) as u64;
        Duration::from_millis(backoff_ms)
    }
}

/// Terminal outcome of an exhausted or aborted retry loop: the last error and
/// the number of attempts actually made.
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub attempts: u32,
    pub error: E,
}

/// Execute an operation with bounded retry.
///
/// `is_transient` decides whether a failure is worth retrying; permanent
/// failures terminate the loop immediately with the attempt count so far.
/// Attempts are strictly sequential: the backoff elapses fully before the
/// next attempt is issued, and dropping the returned future cancels the loop
/// between attempts.
pub async fn retry_with_backoff<F, Fut, T, E, C>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_transient: C,
    f: F,
) -> Result<T, RetryFailure<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    C: Fn(&E) -> bool,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        operation = operation_name,
                        attempt, "Call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                if attempt >= policy.max_attempts || !is_transient(&error) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %error,
                        "Giving up"
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        error,
                    });
                }

                let delay = policy.delay_before(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient failure, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
