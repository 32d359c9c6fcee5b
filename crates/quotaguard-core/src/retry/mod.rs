//! Retry with exponential backoff for capacity-limited remote calls.
//!
//! # Key Types
//!
//! - [`RetryPolicy`] - Budget and backoff configuration
//! - [`BackoffStrategy`] - Delay schedule abstraction, implemented by [`RetryPolicy`]
//! - [`Classifier`] - Decides whether a failure is transient
//! - [`RetryingInvoker`] - Runs an operation under a policy and classifier
//!
//! # Examples
//!
//! ```rust
//! use quotaguard_core::retry::{RetryPolicy, invoke};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let policy = RetryPolicy::builder()
//!     .max_retries(2)
//!     .initial_delay(Duration::from_millis(10))
//!     .build();
//!
//! let text = invoke(|| async { Ok::<_, std::io::Error>("grounded".to_string()) }, &policy).await?;
//! # Ok(())
//! # }
//! ```

mod classify;
mod invoker;
mod policy;
mod strategy;

pub use classify::{Classifier, ErrorClassification, SubstringClassifier, TRANSIENT_MARKERS};
pub use invoker::{RetryingInvoker, invoke};
pub use policy::{PolicyError, RetryPolicy, RetryPolicyBuilder};
pub use strategy::{BackoffSchedule, BackoffStrategy};
