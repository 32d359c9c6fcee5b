//! Caller-owned client handle

use std::future::Future;
use std::sync::Arc;

use quotaguard_core::poll::{PollError, poll_until};
use quotaguard_core::retry::{RetryPolicy, RetryingInvoker};
use secrecy::SecretString;

use crate::{
    config::ClientConfig,
    error::{Error, Result},
};

/// Handle to a generative AI service with quota-aware retries.
///
/// There is no process-wide client: callers construct one explicitly and
/// it is handed to every operation closure, so the operation uses the
/// credentials of the client that runs it. Cloning is cheap.
///
/// # Example
///
/// ```rust,no_run
/// use quotaguard::{Client, Result};
///
/// # async fn generate(_client: &Client, _prompt: &str) -> Result<String> { Ok(String::new()) }
/// # async fn example() -> Result<()> {
/// let client = Client::new("api-key");
///
/// let text = client
///     .invoke(|client| async move { generate(&client, "summarize the filing").await })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    config: ClientConfig,
}

impl Client {
    /// Create a new client with an API key and default policies.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_valid_config(ClientConfig::with_api_key(api_key))
    }

    /// Create a new client builder for advanced configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from a configuration object.
    ///
    /// # Errors
    ///
    /// Returns an error if the retry or poll policy is invalid.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    /// Create a client from `GENAI_*` environment variables.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    fn from_valid_config(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner { config }),
        }
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The API key, for operations that need to authenticate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] if the client has no key.
    pub fn api_key(&self) -> Result<&SecretString> {
        self.inner
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| Error::MissingConfig("api_key".into()))
    }

    /// Base URL override, if configured.
    pub fn base_url(&self) -> Option<&str> {
        self.inner.config.base_url.as_deref()
    }

    /// The retry policy used by [`invoke`](Self::invoke).
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.config.retry
    }

    /// A copy of this client using different credentials.
    ///
    /// Policies and base URL are kept; `self` is unchanged.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        let mut config = self.inner.config.clone();
        config.api_key = Some(SecretString::new(api_key.into().into_boxed_str()));
        Self::from_valid_config(config)
    }

    /// Run an operation against this client, retrying saturation failures.
    ///
    /// `operation` is called once per attempt with a handle to this client.
    /// The final error, if any, is the operation's own last error.
    pub async fn invoke<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnMut(Client) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.invoke_with(self.retry_policy(), operation).await
    }

    /// Like [`invoke`](Self::invoke), with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Policy`] without calling `operation` if `policy` is
    /// invalid.
    pub async fn invoke_with<F, Fut, T>(&self, policy: &RetryPolicy, mut operation: F) -> Result<T>
    where
        F: FnMut(Client) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        policy.validate()?;

        let invoker = RetryingInvoker::new(policy.clone()).with_classifier(Error::classification);
        let result = invoker.invoke(|| operation(self.clone())).await;

        if let Err(err) = &result
            && err.is_saturated()
        {
            tracing::warn!(
                error = %err,
                max_retries = policy.max_retries(),
                "remote capacity still saturated after retries"
            );
        }

        result
    }

    /// Drive a long-running operation until `is_done` accepts its state.
    ///
    /// `refresh` re-fetches the operation; it is called at the configured
    /// poll interval with this client and the latest state.
    ///
    /// # Errors
    ///
    /// Refresh errors are returned as-is; running out of polls is
    /// [`Error::PollExhausted`].
    pub async fn poll_operation<S, F, Fut, D>(&self, initial: S, mut refresh: F, is_done: D) -> Result<S>
    where
        F: FnMut(Client, S) -> Fut,
        Fut: Future<Output = Result<S>>,
        D: Fn(&S) -> bool,
    {
        poll_until(
            initial,
            &self.inner.config.poll,
            |state| refresh(self.clone(), state),
            is_done,
        )
        .await
        .map_err(|err| match err {
            PollError::Operation(err) => err,
            PollError::Exhausted { polls } => Error::PollExhausted { polls },
        })
    }
}

/// Builder for creating a configured Client.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
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
    pub fn poll(mut self, policy: quotaguard_core::poll::PollPolicy) -> Self {
        self.config.poll = policy;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the retry or poll policy is invalid.
    pub fn build(self) -> Result<Client> {
        Client::from_config(self.config)
    }
}
