//! Backoff delay schedules.

use super::policy::RetryPolicy;
use std::time::Duration;

/// A schedule of delays between retry attempts.
///
/// Implementations decide how long to wait before each retry and how many
/// retries are allowed. [`RetryPolicy`] is the standard implementation.
///
/// # Examples
///
/// ```rust
/// use quotaguard_core::retry::{BackoffStrategy, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(3)
///     .initial_delay(Duration::from_secs(1))
///     .build();
///
/// let delays: Vec<_> = policy.schedule().collect();
/// assert_eq!(
///     delays,
///     vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
/// );
/// ```
pub trait BackoffStrategy: Send + Sync {
    /// Delay before retry number `attempt` (0-indexed).
    ///
    /// Called after a transient failure and before sleeping: `next_delay(0)`
    /// is the wait between the first and second attempts. Returns `None` once
    /// the retry budget is spent.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Maximum number of retries after the initial attempt.
    ///
    /// `max_retries() == 3` means up to 4 attempts in total.
    fn max_retries(&self) -> u32;

    /// Iterate over every delay this strategy will produce.
    fn schedule(&self) -> BackoffSchedule<'_, Self>
    where
        Self: Sized,
    {
        BackoffSchedule {
            strategy: self,
            attempt: 0,
        }
    }
}

impl BackoffStrategy for RetryPolicy {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries() {
            return None;
        }

        // attempt 0 is the delay before the first retry
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay().as_secs_f64() * self.backoff_multiplier().powi(exponent);

        // unvalidated policies may carry any jitter
        let jitter = self.jitter().clamp(0.0, 1.0);
        let jittered = if jitter > 0.0 {
            // base * (1 ± jitter)
            base + base * jitter * (rand::random::<f64>() - 0.5) * 2.0
        } else {
            base
        };

        let delay = Duration::try_from_secs_f64(jittered).unwrap_or(Duration::MAX);
        Some(match self.max_delay() {
            Some(cap) => delay.min(cap),
            None => delay,
        })
    }

    fn max_retries(&self) -> u32 {
        RetryPolicy::max_retries(self)
    }
}

/// Iterator over the delays of a [`BackoffStrategy`].
///
/// Created by [`BackoffStrategy::schedule`].
#[derive(Debug)]
pub struct BackoffSchedule<'a, S> {
    strategy: &'a S,
    attempt: u32,
}

impl<S: BackoffStrategy> Iterator for BackoffSchedule<'_, S> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.strategy.next_delay(self.attempt)?;
        self.attempt += 1;
        Some(delay)
    }
}
