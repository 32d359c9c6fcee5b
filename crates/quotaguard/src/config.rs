//! Configuration for the quotaguard client

use quotaguard_core::poll::PollPolicy;
use quotaguard_core::retry::RetryPolicy;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration for a [`Client`](crate::Client).
///
/// Credentials are injected here explicitly rather than read from the
/// environment at call time, so clients can be built with fabricated
/// credentials in tests.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// API key for the generative AI service
    pub api_key: Option<SecretString>,

    /// Base URL override for the API
    pub base_url: Option<String>,

    /// Retry policy applied to every invocation
    pub retry: RetryPolicy,

    /// Poll policy for long-running operations
    pub poll: PollPolicy,
}

impl ClientConfig {
    /// Create a new configuration with an API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::new(api_key.into().into_boxed_str())),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `GENAI_API_KEY` for authentication
    /// - `GENAI_BASE_URL` for the API base URL
    /// - `GENAI_MAX_RETRIES` for the retry budget
    /// - `GENAI_INITIAL_DELAY_MS` for the first backoff delay
    /// - `GENAI_BACKOFF_MULTIPLIER` for delay growth
    /// - `GENAI_MAX_DELAY_MS` for the backoff cap
    /// - `GENAI_POLL_INTERVAL_MS` for long-running operation polling
    ///
    /// Unset variables keep their defaults; set but unparseable ones are an error.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        use std::env;

        let mut config = Self::default();

        if let Ok(api_key) = env::var("GENAI_API_KEY") {
            config.api_key = Some(SecretString::new(api_key.into_boxed_str()));
        }

        if let Ok(base_url) = env::var("GENAI_BASE_URL") {
            config.base_url = Some(base_url);
        }

        let mut retry = RetryPolicy::builder();
        if let Some(max_retries) = env_parse::<u32>("GENAI_MAX_RETRIES")? {
            retry = retry.max_retries(max_retries);
        }
        if let Some(initial_ms) = env_parse::<u64>("GENAI_INITIAL_DELAY_MS")? {
            retry = retry.initial_delay(Duration::from_millis(initial_ms));
        }
        if let Some(multiplier) = env_parse::<f64>("GENAI_BACKOFF_MULTIPLIER")? {
            retry = retry.backoff_multiplier(multiplier);
        }
        if let Some(max_ms) = env_parse::<u64>("GENAI_MAX_DELAY_MS")? {
            retry = retry.max_delay(Duration::from_millis(max_ms));
        }
        config.retry = retry.build();

        if let Some(interval_ms) = env_parse::<u64>("GENAI_POLL_INTERVAL_MS")? {
            config.poll = PollPolicy::builder()
                .interval(Duration::from_millis(interval_ms))
                .build();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a `.env` file (if present) into the environment, then [`from_env`](Self::from_env).
    #[cfg(feature = "env")]
    pub fn from_dotenv() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::InvalidConfig(format!(".env: {e}"))),
        }
        Self::from_env()
    }

    /// Load the `.env` file at `path` into the environment, then [`from_env`](Self::from_env).
    ///
    /// Variables already present in the environment are not overridden.
    #[cfg(feature = "env")]
    pub fn from_dotenv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenvy::from_path(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded .env file");
        Self::from_env()
    }

    /// Parse a TOML configuration document.
    ///
    /// ```toml
    /// api_key = "..."
    /// base_url = "https://generativelanguage.example.com"
    ///
    /// [retry]
    /// max_retries = 4
    /// initial_delay_ms = 1500
    /// backoff_multiplier = 2.0
    ///
    /// [poll]
    /// interval_ms = 8000
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(source)?;
        let config = Self {
            api_key: file.api_key,
            base_url: file.base_url,
            retry: file.retry,
            poll: file.poll,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Check the retry and poll policies.
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;
        self.poll.validate()?;
        Ok(())
    }

    /// Merge this configuration with another, with the other taking precedence.
    ///
    /// Credentials and base URL are taken from `other` when set; policies are
    /// taken from `other` when they differ from the defaults.
    pub fn merge(mut self, other: ClientConfig) -> Self {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.retry != RetryPolicy::default() {
            self.retry = other.retry;
        }
        if other.poll != PollPolicy::default() {
            self.poll = other.poll;
        }
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api_key: Option<SecretString>,
    base_url: Option<String>,
    retry: RetryPolicy,
    poll: PollPolicy,
}

#[cfg(feature = "env")]
fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{name}={raw:?} is not a valid value"))),
        Err(_) => Ok(None),
    }
}

/// Builder for creating ClientConfig with a fluent API.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(SecretString::new(api_key.into().into_boxed_str()));
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set the poll policy.
    pub fn poll(mut self, policy: PollPolicy) -> Self {
        self.config.poll = policy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
