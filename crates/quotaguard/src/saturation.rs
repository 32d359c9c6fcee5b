//! UI-facing reporting of failed invocations.
//!
//! A view that surfaces a failed call needs one distinction: was the shared
//! capacity saturated (offer the user a credential switch) or did something
//! else go wrong. [`FailureReport`] carries that judgement in a serializable
//! form.

use quotaguard_core::retry::ErrorClassification;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// What kind of failure the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Capacity or quota exhausted, even after retries.
    Saturated,
    /// Any other failure.
    General,
}

impl From<ErrorClassification> for FailureKind {
    fn from(classification: ErrorClassification) -> Self {
        match classification {
            ErrorClassification::Transient => FailureKind::Saturated,
            ErrorClassification::Permanent => FailureKind::General,
        }
    }
}

/// Follow-up the UI can offer for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Let the user supply their own credentials to bypass the shared quota.
    SwitchCredentials,
    /// Nothing to offer beyond showing the message.
    None,
}

/// Serializable summary of a surfaced error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Saturated or general
    pub kind: FailureKind,
    /// What the UI should offer
    pub action: SuggestedAction,
    /// The error's own message
    pub message: String,
}

impl FailureReport {
    /// Build a report for any displayable error using the substring rule.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: fmt::Display + fmt::Debug + ?Sized,
    {
        Self::new(ErrorClassification::of(error).into(), error.to_string())
    }

    fn new(kind: FailureKind, message: String) -> Self {
        let action = match kind {
            FailureKind::Saturated => SuggestedAction::SwitchCredentials,
            FailureKind::General => SuggestedAction::None,
        };
        Self {
            kind,
            action,
            message,
        }
    }

    /// Whether the UI should offer a credential switch.
    pub fn offers_credential_switch(&self) -> bool {
        self.action == SuggestedAction::SwitchCredentials
    }
}

impl From<&Error> for FailureReport {
    /// Uses the structured classification of [`Error`].
    fn from(error: &Error) -> Self {
        Self::new(error.classification().into(), error.to_string())
    }
}
