//! Polling long-running remote operations to completion.
//!
//! Media generation jobs (video in particular) are submitted once and then
//! re-fetched at a fixed interval until the remote side reports them done.
//!
//! ```rust
//! use quotaguard_core::poll::{PollPolicy, poll_until};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = PollPolicy::builder()
//!     .interval(Duration::from_millis(10))
//!     .max_polls(5)
//!     .build();
//!
//! let finished = poll_until(
//!     0u32,
//!     &policy,
//!     |progress| async move { Ok::<_, std::io::Error>(progress + 50) },
//!     |progress| *progress >= 100,
//! )
//! .await?;
//! assert_eq!(finished, 100);
//! # Ok(())
//! # }
//! ```

use crate::retry::PolicyError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(8);

/// Failure while polling an operation.
#[derive(Debug, Error)]
pub enum PollError<E> {
    /// A refresh call failed; the error is passed through untouched.
    #[error("{0}")]
    Operation(E),

    /// The operation was still pending after the poll budget ran out.
    #[error("operation still pending after {polls} polls")]
    Exhausted {
        /// Number of refresh calls made
        polls: u32,
    },
}

impl<E> PollError<E> {
    /// The underlying refresh error, if this is one.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(err) => Some(err),
            Self::Exhausted { .. } => None,
        }
    }
}

/// How often to re-fetch a pending operation, and for how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    #[serde(rename = "interval_ms", with = "interval_ms")]
    interval: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_polls: Option<u32>,
}

impl Default for PollPolicy {
    /// Poll every 8 seconds with no upper bound.
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_polls: None,
        }
    }
}

impl PollPolicy {
    /// Create a new builder, starting from the defaults.
    pub fn builder() -> PollPolicyBuilder {
        PollPolicyBuilder::default()
    }

    /// Wait between refreshes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Maximum number of refreshes, if bounded.
    pub fn max_polls(&self) -> Option<u32> {
        self.max_polls
    }

    /// Reject a zero interval, which would spin against the remote API.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.interval.is_zero() {
            return Err(PolicyError::ZeroPollInterval);
        }
        Ok(())
    }
}

/// Builder for [`PollPolicy`].
#[derive(Debug, Default)]
pub struct PollPolicyBuilder {
    interval: Option<Duration>,
    max_polls: Option<u32>,
}

impl PollPolicyBuilder {
    /// Set the wait between refreshes.
    ///
    /// Default: 8s
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Give up after `max_polls` refreshes.
    ///
    /// Default: unbounded
    pub fn max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    /// Build the policy.
    pub fn build(self) -> PollPolicy {
        PollPolicy {
            interval: self.interval.unwrap_or(DEFAULT_INTERVAL),
            max_polls: self.max_polls,
        }
    }
}

/// Refresh `initial` until `is_done` accepts it.
///
/// An already finished `initial` is returned without sleeping. Otherwise each
/// round sleeps for the policy interval and then hands the current state to
/// `refresh`, which returns the next one. Refresh failures end polling
/// immediately as [`PollError::Operation`].
pub async fn poll_until<S, F, Fut, E, D>(
    initial: S,
    policy: &PollPolicy,
    mut refresh: F,
    is_done: D,
) -> Result<S, PollError<E>>
where
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Result<S, E>>,
    D: Fn(&S) -> bool,
{
    let mut state = initial;
    let mut polls = 0u32;

    while !is_done(&state) {
        if policy.max_polls.is_some_and(|max| polls >= max) {
            return Err(PollError::Exhausted { polls });
        }

        tokio::time::sleep(policy.interval).await;
        polls += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(poll = polls, "refreshing pending operation");

        state = refresh(state).await.map_err(PollError::Operation)?;
    }

    Ok(state)
}

mod interval_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
