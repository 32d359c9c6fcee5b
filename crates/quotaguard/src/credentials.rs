//! Verified credential switching.
//!
//! When the shared quota is saturated, the UI lets the user supply their own
//! API key. The switch only counts once a probe call made with the new key
//! actually succeeds; until then the caller keeps its current client.

use std::future::Future;

use crate::{
    client::Client,
    error::{Error, Result},
};

/// Result of [`Client::switch_credentials`].
#[derive(Debug)]
pub enum SwitchOutcome {
    /// The probe succeeded with the new credentials.
    Verified(Client),
    /// The new credentials work but are also out of capacity.
    StillSaturated {
        /// Error returned by the probe
        error: Error,
    },
    /// The probe failed for another reason (bad key, network, ...).
    Rejected {
        /// Error returned by the probe
        error: Error,
    },
}

impl SwitchOutcome {
    /// Whether the new credentials were verified.
    pub fn is_verified(&self) -> bool {
        matches!(self, SwitchOutcome::Verified(_))
    }

    /// The verified client, if any.
    pub fn into_client(self) -> Option<Client> {
        match self {
            SwitchOutcome::Verified(client) => Some(client),
            _ => None,
        }
    }

    /// The probe error, if the switch was not verified.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SwitchOutcome::Verified(_) => None,
            SwitchOutcome::StillSaturated { error } | SwitchOutcome::Rejected { error } => {
                Some(error)
            }
        }
    }
}

impl Client {
    /// Try `api_key` by running `probe` once against a candidate client.
    ///
    /// The probe is not retried: a saturation failure here means the new
    /// credentials do not resolve the quota condition. `self` is never
    /// modified; on success the caller adopts the returned client.
    pub async fn switch_credentials<F, Fut, T>(
        &self,
        api_key: impl Into<String>,
        probe: F,
    ) -> SwitchOutcome
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let candidate = self.with_api_key(api_key);

        match probe(candidate.clone()).await {
            Ok(_) => {
                tracing::info!("credential switch verified");
                SwitchOutcome::Verified(candidate)
            }
            Err(error) if error.is_saturated() => {
                tracing::warn!(error = %error, "new credentials are saturated as well");
                SwitchOutcome::StillSaturated { error }
            }
            Err(error) => {
                tracing::warn!(error = %error, "credential switch rejected");
                SwitchOutcome::Rejected { error }
            }
        }
    }
}
