//! Bounded retry for resolver calls.
//!
//! Only transport failures are retried, with a fixed attempt count and a
//! fixed backoff between attempts. API, decode, and input errors fail
//! immediately because a retry cannot change their outcome.

use std::time::Duration;

use tracing::debug;

use crate::resolver::ResolveError;

/// Default resolve attempts, including the initial one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed backoff between attempts.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Fixed-count, fixed-backoff retry policy for resolve operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with an attempt count (clamped to at least 1) and a
    /// fixed backoff.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the fixed backoff between attempts.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Decides whether the failed attempt should be retried.
    ///
    /// `attempt` is 1-indexed and counts the attempt that just failed.
    /// Returns the delay to sleep before the next attempt, or `None` when
    /// the error is not transient or the attempts are exhausted.
    #[must_use]
    pub fn should_retry(&self, error: &ResolveError, attempt: u32) -> Option<Duration> {
        if !error.is_transient() {
            return None;
        }
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "resolve attempts exhausted");
            return None;
        }
        Some(self.backoff)
    }
}
