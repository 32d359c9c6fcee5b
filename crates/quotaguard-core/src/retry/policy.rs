//! Retry budget and backoff configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_RETRIES: u32 = 4;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1500);
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// A retry policy rejected by [`RetryPolicy::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The first backoff delay must be positive.
    #[error("initial retry delay must be greater than zero")]
    ZeroInitialDelay,

    /// The multiplier must be finite and strictly greater than one.
    #[error("backoff multiplier must be a finite number greater than 1, got {0}")]
    InvalidMultiplier(f64),

    /// Jitter is a fraction of the delay.
    #[error("jitter must be within [0, 1], got {0}")]
    InvalidJitter(f64),

    /// Polling needs a positive interval between refreshes.
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// How many times to retry a transient failure and how long to wait in between.
///
/// Delays grow geometrically: the first retry waits `initial_delay`, each
/// following one waits `backoff_multiplier` times longer, optionally capped
/// at `max_delay` and randomized by `jitter`.
///
/// A policy is immutable for the lifetime of one invocation sequence.
///
/// # Configuration format
///
/// Deserializes from a table where every key is optional:
///
/// ```toml
/// max_retries = 4
/// initial_delay_ms = 1500
/// backoff_multiplier = 2.0
/// max_delay_ms = 30000
/// jitter = 0.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    max_retries: u32,
    #[serde(rename = "initial_delay_ms", with = "duration_ms")]
    initial_delay: Duration,
    backoff_multiplier: f64,
    #[serde(
        rename = "max_delay_ms",
        with = "option_duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    max_delay: Option<Duration>,
    jitter: f64,
}

impl Default for RetryPolicy {
    /// Defaults:
    /// - `max_retries`: 4
    /// - `initial_delay`: 1500ms
    /// - `backoff_multiplier`: 2.0
    /// - `max_delay`: none
    /// - `jitter`: 0.0
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_multiplier: DEFAULT_MULTIPLIER,
            max_delay: None,
            jitter: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new builder, starting from the defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use quotaguard_core::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::builder()
    ///     .max_retries(2)
    ///     .initial_delay(Duration::from_millis(500))
    ///     .build();
    /// assert_eq!(policy.max_retries(), 2);
    /// ```
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Additional attempts permitted after the first failure.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Factor applied to the delay after each retry.
    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Upper bound on a single delay, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Fraction of each delay that is randomized.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Check that the policy describes a growing, positive backoff.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.initial_delay.is_zero() {
            return Err(PolicyError::ZeroInitialDelay);
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 1.0 {
            return Err(PolicyError::InvalidMultiplier(self.backoff_multiplier));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(PolicyError::InvalidJitter(self.jitter));
        }
        Ok(())
    }
}

/// Builder for [`RetryPolicy`].
///
/// Unset parameters fall back to the [`RetryPolicy::default`] values.
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_retries: Option<u32>,
    initial_delay: Option<Duration>,
    backoff_multiplier: Option<f64>,
    max_delay: Option<Duration>,
    jitter: Option<f64>,
}

impl RetryPolicyBuilder {
    /// Set the retry budget.
    ///
    /// Default: 4
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the delay before the first retry.
    ///
    /// Default: 1500ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the exponential multiplier.
    ///
    /// Default: 2.0 (doubles each time)
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = Some(multiplier);
        self
    }

    /// Cap every delay at `delay`.
    ///
    /// Default: uncapped
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// A jitter of 0.1 lets each delay vary by ±10%. Values outside the
    /// range are rejected by [`try_build`](Self::try_build).
    ///
    /// Default: 0.0
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Build the policy.
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            initial_delay: self.initial_delay.unwrap_or(DEFAULT_INITIAL_DELAY),
            backoff_multiplier: self.backoff_multiplier.unwrap_or(DEFAULT_MULTIPLIER),
            max_delay: self.max_delay,
            jitter: self.jitter.unwrap_or(0.0),
        }
    }

    /// Build the policy and [`validate`](RetryPolicy::validate) it.
    pub fn try_build(self) -> Result<RetryPolicy, PolicyError> {
        let policy = self.build();
        policy.validate()?;
        Ok(policy)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(delay) => serializer.serialize_some(&(delay.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 4);
        assert_eq!(policy.initial_delay(), Duration::from_millis(1500));
        assert_eq!(policy.backoff_multiplier(), 2.0);
        assert_eq!(policy.max_delay(), None);
        assert_eq!(policy.jitter(), 0.0);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_builder_matches_default() {
        assert_eq!(RetryPolicy::builder().build(), RetryPolicy::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let policy = RetryPolicy::builder()
            .max_retries(7)
            .initial_delay(Duration::from_millis(200))
            .backoff_multiplier(1.5)
            .max_delay(Duration::from_secs(30))
            .jitter(0.2)
            .build();

        assert_eq!(policy.max_retries(), 7);
        assert_eq!(policy.initial_delay(), Duration::from_millis(200));
        assert_eq!(policy.backoff_multiplier(), 1.5);
        assert_eq!(policy.max_delay(), Some(Duration::from_secs(30)));
        assert_eq!(policy.jitter(), 0.2);
    }

    #[test]
    fn test_jitter_out_of_range_rejected() {
        let high = RetryPolicy::builder().jitter(2.0).try_build();
        assert_eq!(high, Err(PolicyError::InvalidJitter(2.0)));

        let low = RetryPolicy::builder().jitter(-0.5).try_build();
        assert_eq!(low, Err(PolicyError::InvalidJitter(-0.5)));

        // same answer as a deserialized policy
        let parsed: RetryPolicy = serde_json::from_str(r#"{"jitter": 2.0}"#).unwrap();
        assert_eq!(parsed.validate(), Err(PolicyError::InvalidJitter(2.0)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = RetryPolicy::builder().initial_delay(Duration::ZERO).try_build();
        assert_eq!(zero, Err(PolicyError::ZeroInitialDelay));

        let flat = RetryPolicy::builder().backoff_multiplier(1.0).try_build();
        assert_eq!(flat, Err(PolicyError::InvalidMultiplier(1.0)));

        let nan = RetryPolicy::builder().backoff_multiplier(f64::NAN).build();
        assert!(matches!(
            nan.validate(),
            Err(PolicyError::InvalidMultiplier(_))
        ));
    }

    #[test]
    fn test_no_retry_is_valid() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_retries(), 0);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_table() {
        let policy: RetryPolicy = toml::from_str("max_retries = 2\ninitial_delay_ms = 1000").unwrap();
        assert_eq!(policy.max_retries(), 2);
        assert_eq!(policy.initial_delay(), Duration::from_millis(1000));
        assert_eq!(policy.backoff_multiplier(), 2.0);
        assert_eq!(policy.max_delay(), None);
    }

    #[test]
    fn test_deserialize_max_delay() {
        let policy: RetryPolicy = toml::from_str("max_delay_ms = 30000").unwrap();
        assert_eq!(policy.max_delay(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_json_uses_millisecond_fields() {
        let json = serde_json::to_value(RetryPolicy::default()).unwrap();
        assert_eq!(json["initial_delay_ms"], 1500);
        assert_eq!(json["max_retries"], 4);
        assert!(json.get("max_delay_ms").is_none());
    }
}
