//! Bounded retry with exponential backoff
//!
//! One policy is applied to every network operation of a run: judge
//! queries as well as repository reads and writes.

use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;

use crate::{Error, Result};

/// How often and how patiently a failing operation is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately. Intended for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.2,
            multiplier: self.multiplier,
            max_interval: self.max_delay,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }

    /// Run `op`, retrying failures classified as transient by
    /// [`Error::is_transient`].
    pub fn retry<T, E, F>(&self, operation: &str, op: F) -> Result<T>
    where
        E: Into<Error>,
        F: FnMut() -> std::result::Result<T, E>,
    {
        self.retry_if(operation, Error::is_transient, op)
    }

    /// Run `op`, retrying failures for which `is_retryable` holds.
    ///
    /// Non-retryable failures are returned unchanged. When the attempt
    /// budget runs out the last failure is wrapped in
    /// [`Error::RetriesExhausted`].
    pub fn retry_if<T, E, F, P>(&self, operation: &str, is_retryable: P, mut op: F) -> Result<T>
    where
        E: Into<Error>,
        F: FnMut() -> std::result::Result<T, E>,
        P: Fn(&Error) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = self.backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err: Error = match op() {
                Ok(value) => return Ok(value),
                Err(e) => e.into(),
            };

            if !is_retryable(&err) {
                return Err(err);
            }

            if attempt >= max_attempts {
                tracing::error!(operation, attempts = attempt, error = %err, "retries exhausted");
                return Err(Error::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let delay = backoff.next_backoff().unwrap_or(self.max_delay);
            tracing::warn!(
                operation,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient failure, retrying"
            );
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn unavailable() -> leetsync_judge::Error {
        leetsync_judge::Error::Status {
            status: 503,
            body: String::new(),
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::immediate(3);

        let value = policy
            .retry("flaky", || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(unavailable())
                } else {
                    Ok(42)
                }
            })
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhaustion_reports_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::immediate(4);

        let err = policy
            .retry("always down", || -> std::result::Result<(), _> {
                calls.set(calls.get() + 1);
                Err(unavailable())
            })
            .unwrap_err();

        assert_eq!(calls.get(), 4);
        match err {
            Error::RetriesExhausted {
                operation,
                attempts,
                source,
            } => {
                assert_eq!(operation, "always down");
                assert_eq!(attempts, 4);
                assert!(source.is_transient());
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::immediate(5);

        let err = policy
            .retry("bad payload", || -> std::result::Result<(), _> {
                calls.set(calls.get() + 1);
                Err(leetsync_judge::Error::schema("missing field"))
            })
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert!(matches!(err, Error::Judge(leetsync_judge::Error::Schema { .. })));
    }

    #[test]
    fn custom_predicate_controls_retries() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::immediate(5);

        let result = policy.retry_if(
            "never retried",
            |_| false,
            || -> std::result::Result<(), _> {
                calls.set(calls.get() + 1);
                Err(unavailable())
            },
        );

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::immediate(0);
        let _ = policy.retry("once", || -> std::result::Result<(), _> {
            calls.set(calls.get() + 1);
            Err(unavailable())
        });
        assert_eq!(calls.get(), 1);
    }
}
