// SPDX-FileCopyrightText: 2026 Unison Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry loop with per-attempt timeout and capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use unison_core::ContextError;

/// Outcome classification of a single failed attempt.
#[derive(Debug)]
pub enum Attempt<E> {
    /// Worth retrying (connection refused, 5xx, 429).
    Transient(E),
    /// Retrying cannot help (4xx, malformed response).
    Permanent(E),
}

/// Why a retried operation gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; holds the last failure.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// Every attempt timed out.
    #[error("gave up after {attempts} attempts, last one timed out after {timeout:?}")]
    TimedOut { attempts: u32, timeout: Duration },

    /// A non-retryable failure.
    #[error("{0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    /// Number of attempts spent, where known.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::TimedOut { attempts, .. } => {
                Some(*attempts)
            }
            RetryError::Permanent(_) => None,
        }
    }
}

impl From<RetryError<ContextError>> for ContextError {
    fn from(err: RetryError<ContextError>) -> Self {
        match err {
            RetryError::Exhausted { last, .. } => last,
            RetryError::TimedOut { timeout, .. } => ContextError::Timeout { duration: timeout },
            RetryError::Permanent(e) => e,
        }
    }
}

/// Retry budget for one collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            attempt_timeout,
        }
    }

    /// Delay slept after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// `name` only labels log lines.
    pub async fn run<T, E, F, Fut>(&self, name: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Attempt<E>>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last: Option<E> = None;

        for attempt in 1..=max_attempts {
            match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        debug!(op = name, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(Attempt::Permanent(err))) => {
                    debug!(op = name, attempt, error = %err, "permanent failure, not retrying");
                    return Err(RetryError::Permanent(err));
                }
                Ok(Err(Attempt::Transient(err))) => {
                    warn!(op = name, attempt, max_attempts, error = %err, "transient failure");
                    last = Some(err);
                }
                Err(_) => {
                    warn!(
                        op = name,
                        attempt,
                        max_attempts,
                        timeout_ms = self.attempt_timeout.as_millis() as u64,
                        "attempt timed out"
                    );
                    last = None;
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }

        Err(match last {
            Some(last) => RetryError::Exhausted {
                attempts: max_attempts,
                last,
            },
            None => RetryError::TimedOut {
                attempts: max_attempts,
                timeout: self.attempt_timeout,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(10),
            Duration::from_millis(40),
            Duration::from_millis(50),
        )
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = fast_policy(5);
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(3), Duration::from_millis(40));
        assert_eq!(policy.backoff(4), Duration::from_millis(40));
        assert_eq!(policy.backoff(100), Duration::from_millis(40));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<u32, RetryError<String>> = fast_policy(3)
            .run("test", || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(Attempt::Transient(format!("boom {n}")))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), RetryError<String>> = fast_policy(5)
            .run("test", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Attempt::Permanent("bad request".to_string()))
                }
            })
            .await;
        assert!(matches!(result, Err(RetryError::Permanent(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_last_error() {
        let result: Result<(), RetryError<String>> = fast_policy(2)
            .run("test", || async { Err(Attempt::Transient("down".to_string())) })
            .await;
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last, "down");
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[test]
    fn timeouts_convert_to_context_timeout() {
        let err: ContextError = RetryError::<ContextError>::TimedOut {
            attempts: 3,
            timeout: Duration::from_secs(2),
        }
        .into();
        assert!(matches!(err, ContextError::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_attempts_time_out() {
        let result: Result<(), RetryError<String>> = fast_policy(2)
            .run("test", || async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(RetryError::TimedOut { attempts: 2, .. })
        ));
    }
}
