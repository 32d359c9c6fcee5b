#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core retry primitives for the quotaguard ecosystem.
//!
//! This crate holds the pieces of a generative-AI client that carry an actual
//! contract, independent of any particular remote API:
//!
//! - **Retrying invocation** via [`RetryingInvoker`](retry::RetryingInvoker)
//!   - Exponential backoff with optional cap and jitter
//!   - Capacity/quota error classification via the [`Classifier`](retry::Classifier) seam
//!   - Original errors are returned untouched
//! - **Long-running operation polling** via [`poll_until`](poll::poll_until)
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use quotaguard_core::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::builder()
//!     .max_retries(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .build();
//!
//! let value = RetryingInvoker::new(policy)
//!     .invoke(|| async { Ok::<_, std::io::Error>(42) })
//!     .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

pub mod poll;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use quotaguard_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::poll::{PollError, PollPolicy, poll_until};
    pub use crate::retry::{
        BackoffStrategy, Classifier, ErrorClassification, RetryPolicy, RetryPolicyBuilder,
        RetryingInvoker, SubstringClassifier, invoke,
    };
}
