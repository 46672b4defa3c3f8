//! Bounded retry with per-error backoff.
//!
//! The policy decides how long to wait after each failure; the `Sleeper`
//! performs the wait. Tests substitute a sleeper that records delays instead
//! of blocking.

use super::provider::DataError;
use std::time::Duration;
use tracing::warn;

/// Blocking wait abstraction.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeper.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Delay schedule for one class of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failed attempt.
    Fixed(Duration),
    /// `step × attempt`, with attempts counted from 1.
    Linear(Duration),
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Linear(step) => step * attempt.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// After HTTP 429.
    pub rate_limited: Backoff,
    /// After HTTP 403.
    pub forbidden: Backoff,
    /// After any other retryable error.
    pub other: Backoff,
}

impl RetryPolicy {
    /// Finnhub free tier: 3 attempts, 30 s × n on 429, 60 s on 403, 5 s otherwise.
    pub fn finnhub() -> Self {
        Self {
            max_attempts: 3,
            rate_limited: Backoff::Linear(Duration::from_secs(30)),
            forbidden: Backoff::Fixed(Duration::from_secs(60)),
            other: Backoff::Fixed(Duration::from_secs(5)),
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            rate_limited: Backoff::Fixed(Duration::ZERO),
            forbidden: Backoff::Fixed(Duration::ZERO),
            other: Backoff::Fixed(Duration::ZERO),
        }
    }

    /// Wait before the next attempt after `err` on 1-based `attempt`, or
    /// `None` if `err` is final.
    pub fn delay_for(&self, err: &DataError, attempt: u32) -> Option<Duration> {
        if !err.is_retryable() {
            return None;
        }
        let backoff = match err {
            DataError::RateLimited => self.rate_limited,
            DataError::Forbidden => self.forbidden,
            _ => self.other,
        };
        Some(backoff.delay(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::finnhub()
    }
}

/// Run `op` until it succeeds, fails with a final error, or the attempt
/// budget runs out. `op` receives the 1-based attempt number. No sleep
/// follows the last attempt.
pub fn retry<T, F>(policy: &RetryPolicy, sleeper: &dyn Sleeper, mut op: F) -> Result<T, DataError>
where
    F: FnMut(u32) -> Result<T, DataError>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => {
                let delay = match policy.delay_for(&err, attempt) {
                    Some(d) if attempt < max_attempts => d,
                    _ => return Err(err),
                };
                warn!(
                    "attempt {attempt}/{max_attempts} failed: {err}; retrying in {}s",
                    delay.as_secs_f64()
                );
                sleeper.sleep(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records requested delays without blocking.
    #[derive(Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    impl RecordingSleeper {
        pub(crate) fn recorded(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn succeeds_first_try_without_sleeping() {
        let sleeper = RecordingSleeper::default();
        let out = retry(&RetryPolicy::finnhub(), &sleeper, |_| Ok::<_, DataError>(7));
        assert_eq!(out.unwrap(), 7);
        assert!(sleeper.recorded().is_empty());
    }

    #[test]
    fn rate_limit_escalates() {
        let sleeper = RecordingSleeper::default();
        let out: Result<(), _> = retry(&RetryPolicy::finnhub(), &sleeper, |_| {
            Err(DataError::RateLimited)
        });
        assert!(matches!(out, Err(DataError::RateLimited)));
        assert_eq!(sleeper.recorded(), vec![secs(30), secs(60)]);
    }

    #[test]
    fn forbidden_waits_fixed() {
        let sleeper = RecordingSleeper::default();
        let out: Result<(), _> =
            retry(&RetryPolicy::finnhub(), &sleeper, |_| Err(DataError::Forbidden));
        assert!(out.is_err());
        assert_eq!(sleeper.recorded(), vec![secs(60), secs(60)]);
    }

    #[test]
    fn other_errors_wait_short() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let out = retry(&RetryPolicy::finnhub(), &sleeper, |attempt| {
            calls += 1;
            if attempt < 3 {
                Err(DataError::HttpStatus { status: 502 })
            } else {
                Ok("ok")
            }
        });
        assert_eq!(out.unwrap(), "ok");
        assert_eq!(calls, 3);
        assert_eq!(sleeper.recorded(), vec![secs(5), secs(5)]);
    }

    #[test]
    fn final_error_is_not_retried() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let out: Result<(), _> = retry(&RetryPolicy::finnhub(), &sleeper, |_| {
            calls += 1;
            Err(DataError::SymbolNotFound { symbol: "ZZZ".into() })
        });
        assert!(out.is_err());
        assert_eq!(calls, 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[test]
    fn mixed_errors_use_matching_backoff() {
        let sleeper = RecordingSleeper::default();
        let out: Result<(), _> = retry(&RetryPolicy::finnhub(), &sleeper, |attempt| match attempt {
            1 => Err(DataError::Forbidden),
            2 => Err(DataError::RateLimited),
            _ => Err(DataError::NetworkUnreachable("reset".into())),
        });
        assert!(matches!(out, Err(DataError::NetworkUnreachable(_))));
        // 403 on attempt 1, then 429 on attempt 2 (30 s × 2).
        assert_eq!(sleeper.recorded(), vec![secs(60), secs(60)]);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::none()
        };
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let _: Result<(), _> = retry(&policy, &sleeper, |_| {
            calls += 1;
            Err(DataError::RateLimited)
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn linear_backoff_counts_from_one() {
        let b = Backoff::Linear(secs(30));
        assert_eq!(b.delay(1), secs(30));
        assert_eq!(b.delay(3), secs(90));
        assert_eq!(b.delay(0), secs(30));
    }
}
