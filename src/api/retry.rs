//! Read-timeout retry with exponential backoff and jitter.
//!
//! Only `TransportError::ReadTimeout` is retried. Refused connections and
//! every HTTP status are handed back to the caller after the first attempt.

use std::thread;
use std::time::{Duration, Instant};

use log::warn;
use rand::Rng;

use super::error::ApiError;
use super::transport::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Wait before the second attempt, before jitter.
    pub wait_initial: Duration,
    /// Upper bound on the exponential part of the wait.
    pub wait_max: Duration,
    /// Random extra wait in `0..wait_jitter` added to every backoff.
    pub wait_jitter: Duration,
    /// Give up once this much time has passed since the first attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            wait_initial: Duration::from_millis(100),
            wait_max: Duration::from_secs(5),
            wait_jitter: Duration::from_secs(1),
            timeout: Duration::from_secs(45),
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget as the default but without any waiting between attempts.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            wait_initial: Duration::ZERO,
            wait_max: Duration::ZERO,
            wait_jitter: Duration::ZERO,
            timeout: Duration::MAX,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Deterministic part of the wait after the given (1-based) failed attempt.
    pub fn base_backoff(&self, failed_attempt: u32) -> Duration {
        let exp = failed_attempt.saturating_sub(1).min(31);
        self.wait_initial
            .saturating_mul(1u32 << exp)
            .min(self.wait_max)
    }

    fn backoff(&self, failed_attempt: u32) -> Duration {
        let base = self.base_backoff(failed_attempt);
        let jitter_ms = self.wait_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        let jitter: u64 = rand::thread_rng().gen_range(0..jitter_ms);
        base + Duration::from_millis(jitter)
    }

    /// Run `op` until it succeeds, fails with something other than a read
    /// timeout, or the attempt/time budget is spent.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Result<T, TransportError>,
    {
        let start = Instant::now();
        let max_attempts = self.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(err)
                    if err.is_read_timeout()
                        && attempt < max_attempts
                        && start.elapsed() < self.timeout =>
                {
                    let wait = self.backoff(attempt);
                    warn!(
                        "{} timed out (attempt {}/{}), retrying in {:?}",
                        what, attempt, max_attempts, wait
                    );
                    thread::sleep(wait);
                }
                Err(err) => return Err(give_up(err, attempt)),
            }
        }
    }
}

fn give_up(err: TransportError, attempts: u32) -> ApiError {
    match err {
        TransportError::ReadTimeout(message) => ApiError::Timeout { attempts, message },
        TransportError::Network(message) => ApiError::NetworkError(message),
        TransportError::InvalidPath(segment) => ApiError::InvalidIdentifier(segment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.wait_initial, Duration::from_millis(100));
        assert_eq!(policy.timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_base_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_backoff(1), Duration::from_millis(100));
        assert_eq!(policy.base_backoff(2), Duration::from_millis(200));
        assert_eq!(policy.base_backoff(3), Duration::from_millis(400));
        assert_eq!(policy.base_backoff(10), Duration::from_secs(5));
        assert_eq!(policy.base_backoff(1000), Duration::from_secs(5));
    }

    #[test]
    fn test_success_on_first_attempt() {
        let mut calls = 0;
        let result = RetryPolicy::immediate(5).run("op", || {
            calls += 1;
            Ok::<_, TransportError>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_read_timeout_retried_until_success() {
        let mut calls = 0;
        let result = RetryPolicy::immediate(5).run("op", || {
            calls += 1;
            if calls < 3 {
                Err(TransportError::ReadTimeout("slow".to_string()))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_read_timeout_exhausts_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::immediate(5).run("op", || {
            calls += 1;
            Err(TransportError::ReadTimeout("slow".to_string()))
        });
        assert_eq!(calls, 5);
        match result {
            Err(ApiError::Timeout { attempts, message }) => {
                assert_eq!(attempts, 5);
                assert_eq!(message, "slow");
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_network_error_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::immediate(5).run("op", || {
            calls += 1;
            Err(TransportError::Network("connection refused".to_string()))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ApiError::NetworkError(m)) if m == "connection refused"));
    }

    #[test]
    fn test_invalid_path_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::immediate(5).run("op", || {
            calls += 1;
            Err(TransportError::InvalidPath("..".to_string()))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ApiError::InvalidIdentifier(s)) if s == ".."));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::immediate(0).run("op", || {
            calls += 1;
            Err(TransportError::ReadTimeout("slow".to_string()))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ApiError::Timeout { attempts: 1, .. })));
    }

    #[test]
    fn test_elapsed_budget_stops_retries() {
        let policy = RetryPolicy {
            timeout: Duration::ZERO,
            ..RetryPolicy::immediate(5)
        };
        let mut calls = 0;
        let result: Result<(), _> = policy.run("op", || {
            calls += 1;
            Err(TransportError::ReadTimeout("slow".to_string()))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ApiError::Timeout { attempts: 1, .. })));
    }
}
