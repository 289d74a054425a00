//! Exponential backoff for whole classification runs.
//!
//! Runs are idempotent, so a batch that hit an unreachable store is simply
//! re-run from the top after a delay.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry.
    pub base_delay: Duration,
    /// Upper bound on the delay before jitter.
    pub max_delay: Duration,
    /// Add 0-50% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let exponential = base.saturating_mul(2_u64.saturating_pow(attempt));
        let delay = exponential.min(self.max_delay.as_millis() as u64);

        if self.jitter {
            let jitter = fastrand::u64(0..=delay / 2);
            Duration::from_millis(delay + jitter)
        } else {
            Duration::from_millis(delay)
        }
    }
}

/// Outcome of [`retry`].
#[derive(Debug)]
pub struct Retried<T, E> {
    pub result: Result<T, E>,
    /// Attempts made, 1 when the first attempt settled it.
    pub attempts: u32,
    pub total_duration: Duration,
}

/// Run `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or the policy runs out of retries.
///
/// `operation` receives the 0-based attempt number.
pub fn retry<T, E, F, P>(policy: &RetryPolicy, mut operation: F, should_retry: P) -> Retried<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    P: Fn(&Result<T, E>) -> bool,
{
    let start = Instant::now();
    let mut attempt = 0;
    loop {
        let result = operation(attempt);
        if attempt >= policy.max_retries || !should_retry(&result) {
            return Retried {
                result,
                attempts: attempt + 1,
                total_duration: start.elapsed(),
            };
        }
        std::thread::sleep(policy.delay_for(attempt));
        attempt += 1;
    }
}
