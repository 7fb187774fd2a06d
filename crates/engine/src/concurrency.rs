//! Retry and deadline handling wrapped around a single workspace
//! operation.
//!
//! The lock discipline in `kybase-storage` is a blocking mutex, so
//! contention stalls rather than failing with `RetryableBusy` the way a
//! `BEGIN IMMEDIATE`-style backend might. This wrapper still enforces
//! the per-call deadline and retries any `RetryableBusy` a pluggable
//! backend could produce, so swapping the storage layer later does not
//! require touching call sites.

use kybase_core::Error;
use std::time::{Duration, Instant};

/// Maximum internal retries of a `RetryableBusy` failure before it is
/// propagated to the caller.
pub const MAX_RETRIES: u32 = 5;

/// Run `op` until it succeeds, the deadline elapses, or retries are
/// exhausted. `RetryableBusy` is retried with exponential backoff;
/// every other error or success is returned immediately.
pub fn with_retry<T>(deadline: Instant, mut op: impl FnMut() -> Result<T, Error>) -> Result<T, Error> {
    let mut attempt = 0;
    loop {
        if Instant::now() >= deadline {
            return Err(Error::Timeout);
        }
        match op() {
            Err(Error::RetryableBusy) if attempt < MAX_RETRIES => {
                attempt += 1;
                tracing::warn!(attempt, "retrying after RetryableBusy");
                std::thread::sleep(backoff(attempt));
            }
            other => return other,
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(5u64.saturating_mul(1u64 << attempt.min(6)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_immediately_when_op_succeeds() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let result = with_retry(deadline, || Ok::<_, Error>(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn retries_busy_until_success() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut attempts = 0;
        let result = with_retry(deadline, || {
            attempts += 1;
            if attempts < 3 {
                Err(Error::RetryableBusy)
            } else {
                Ok(attempts)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn elapsed_deadline_yields_timeout() {
        let deadline = Instant::now() - Duration::from_millis(1);
        let result = with_retry(deadline, || Ok::<_, Error>(1));
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[test]
    fn non_busy_error_propagates_without_retry() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let mut attempts = 0;
        let result: Result<i32, Error> = with_retry(deadline, || {
            attempts += 1;
            Err(Error::NotFound)
        });
        assert!(matches!(result, Err(Error::NotFound)));
        assert_eq!(attempts, 1);
    }
}
