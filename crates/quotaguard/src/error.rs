//! Error types for quotaguard
//!
//! Remote failures are parsed from the API's JSON error envelope into
//! structured variants, so saturation can be recognized by status code
//! first and by the substring rule for any other remote failure.

use quotaguard_core::retry::{ErrorClassification, PolicyError};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for operations that can fail with a quotaguard error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for quotaguard.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote service is over capacity or out of quota (429 / RESOURCE_EXHAUSTED).
    #[error("Rate limit exceeded (429): {message}")]
    RateLimit {
        /// Error message from the API
        message: String,
        /// Delay suggested by the API before trying again
        retry_after: Option<Duration>,
    },

    /// Authentication or authorization failed (401 / 403).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The request was rejected as malformed (400).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other API error status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
        /// Status string from the API, e.g. `INTERNAL`
        code: Option<String>,
    },

    /// Network or connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A long-running operation did not finish within its poll budget.
    #[error("Operation still pending after {polls} polls")]
    PollExhausted {
        /// Number of refreshes made
        polls: u32,
    },

    /// Missing required configuration.
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// A configuration value could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Retry or poll policy failed validation.
    #[error("Invalid policy: {0}")]
    Policy(#[from] PolicyError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("Configuration file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors not covered by specific variants.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an error from an HTTP status and response body.
    ///
    /// Understands the `{"error": {"code", "message", "status", "details"}}`
    /// envelope; anything else falls back to the raw body as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let (message, code, retry_after) = match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(envelope) => {
                let retry_after = envelope.error.retry_delay();
                (envelope.error.message, envelope.error.status, retry_after)
            }
            Err(_) => (body.to_string(), None, None),
        };

        let exhausted = code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("RESOURCE_EXHAUSTED"));

        match status {
            429 => Error::RateLimit {
                message,
                retry_after,
            },
            _ if exhausted => Error::RateLimit {
                message,
                retry_after,
            },
            400 => Error::InvalidRequest(message),
            401 | 403 => Error::Authentication(message),
            _ => Error::Api {
                status,
                message,
                code,
            },
        }
    }

    /// Classify this error as transient capacity exhaustion or permanent.
    ///
    /// A 429 status decides directly. Other remote failures (`Authentication`,
    /// `InvalidRequest`, `Api`, `Connection`, `Io`, `Other`) still go through
    /// the substring rule. Local failures are always permanent.
    pub fn classification(&self) -> ErrorClassification {
        match self {
            Error::RateLimit { .. } => ErrorClassification::Transient,
            Error::Api { status: 429, .. } => ErrorClassification::Transient,
            Error::PollExhausted { .. }
            | Error::MissingConfig(_)
            | Error::InvalidConfig(_)
            | Error::Policy(_)
            | Error::Serialization(_)
            | Error::Toml(_) => ErrorClassification::Permanent,
            _ => ErrorClassification::of(self),
        }
    }

    /// Whether the remote service reported itself saturated.
    pub fn is_saturated(&self) -> bool {
        self.classification().is_transient()
    }

    /// Delay suggested by the API, if this is a rate limit error that carried one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

// Helper structures for parsing API error responses

#[derive(Debug, serde::Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetails,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetails {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl ApiErrorDetails {
    /// `retryDelay` of a `google.rpc.RetryInfo` detail, e.g. `"34s"` or `"1.5s"`.
    fn retry_delay(&self) -> Option<Duration> {
        self.details
            .iter()
            .filter_map(|detail| detail.get("retryDelay")?.as_str())
            .find_map(|delay| {
                let secs = delay.strip_suffix('s')?.parse::<f64>().ok()?;
                Duration::try_from_secs_f64(secs).ok()
            })
    }
}
