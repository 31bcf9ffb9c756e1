//! Bounded retry with a fixed per-attempt timeout.
//!
//! Network work in this crate never loops ad hoc: every retriable
//! operation goes through [`with_retries`], which owns the attempt
//! budget, the per-attempt wall clock, and the warn-per-attempt logging.
//! There is deliberately no backoff growth; the sources queried here are
//! large public endpoints and the per-section budgets are tiny.

use std::future::Future;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Attempt budget and per-attempt timeout for one retriable operation.
///
/// `attempts` is the total number of tries, so a policy of 3 makes at most
/// three calls. Each try is individually capped at `timeout`; a try that
/// outlives it counts as a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `attempts` is clamped to at least one try.
    pub fn new(attempts: u32, timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            timeout,
        }
    }
}

impl Default for RetryPolicy {
    /// Three attempts of one second each.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Terminal outcome of a retried operation that never succeeded.
#[derive(Debug, Error, Diagnostic)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every attempt failed or timed out. `last` carries the final
    /// attempt's error when that attempt produced one (a timeout does not).
    #[error("{label}: no success after {attempts} attempt(s)")]
    #[diagnostic(
        code(slidesmith::retry::exhausted),
        help("raise the attempt budget or the per-attempt timeout if the upstream is healthy but slow")
    )]
    Exhausted {
        label: &'static str,
        attempts: u32,
        #[source]
        last: Option<E>,
    },
}

/// Runs `op` until it succeeds or the policy's attempt budget is spent.
///
/// Each attempt runs under `tokio::time::timeout(policy.timeout, ..)`.
/// Failed and timed-out attempts are logged at warn level with the given
/// `label`; exhaustion returns [`RetryError::Exhausted`] carrying the last
/// concrete error seen.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use slidesmith::retry::{with_retries, RetryPolicy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = RetryPolicy::new(3, Duration::from_secs(1));
/// let value = with_retries(policy, "demo", || async { Ok::<_, std::io::Error>(7) })
///     .await
///     .unwrap();
/// assert_eq!(value, 7);
/// # }
/// ```
pub async fn with_retries<T, E, F, Fut>(
    policy: RetryPolicy,
    label: &'static str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    let mut last: Option<E> = None;
    for attempt in 1..=policy.attempts {
        match tokio::time::timeout(policy.timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => {
                tracing::warn!(
                    label,
                    attempt,
                    attempts = policy.attempts,
                    error = %err,
                    "attempt failed"
                );
                last = Some(err);
            }
            Err(_elapsed) => {
                tracing::warn!(
                    label,
                    attempt,
                    attempts = policy.attempts,
                    timeout = ?policy.timeout,
                    "attempt timed out"
                );
            }
        }
    }
    Err(RetryError::Exhausted {
        label,
        attempts: policy.attempts,
        last,
    })
}
