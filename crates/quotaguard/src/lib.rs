//! # quotaguard
//!
//! Client-side resilience for quota-limited generative AI APIs:
//! - Caller-owned [`Client`] with injected credentials
//! - Automatic retries of capacity/quota failures with exponential backoff
//! - Polling of long-running operations (video generation)
//! - Saturation reporting for the UI, with a suggested credential switch
//! - Credential switches that are verified before they are adopted
//!
//! The remote API itself stays opaque: every call is an operation closure
//! that receives the client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quotaguard::{Client, FailureReport};
//!
//! # async fn generate_image(_client: &Client, _prompt: &str) -> quotaguard::Result<Vec<u8>> { Ok(vec![]) }
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::new("your-api-key");
//!
//!     match client
//!         .invoke(|client| async move { generate_image(&client, "a lighthouse at dusk").await })
//!         .await
//!     {
//!         Ok(png) => println!("{} bytes", png.len()),
//!         Err(err) => {
//!             let report = FailureReport::from(&err);
//!             if report.offers_credential_switch() {
//!                 println!("shared capacity saturated: {}", report.message);
//!             }
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use credentials::SwitchOutcome;
pub use error::{Error, Result};
pub use saturation::{FailureKind, FailureReport, SuggestedAction};

pub use quotaguard_core::poll::PollPolicy;
pub use quotaguard_core::retry::{ErrorClassification, PolicyError, RetryPolicy};

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod saturation;
