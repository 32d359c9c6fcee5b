//! Transient-vs-permanent failure classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Substrings that mark a failure as a capacity or quota problem.
///
/// Matching is done against the lowercased error text, so the markers are
/// stored lowercase.
pub const TRANSIENT_MARKERS: [&str; 3] = ["429", "resource_exhausted", "quota"];

/// Judgement about whether a failed call is worth retrying.
///
/// Computed per failure and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClassification {
    /// The remote service is over capacity or out of quota; retrying may succeed.
    Transient,
    /// Anything else: malformed request, auth failure, unrelated network error.
    Permanent,
}

impl ErrorClassification {
    /// Classify an error value by its textual rendering.
    ///
    /// The text is the error's `Display` output followed by its `Debug`
    /// output, so structured fields and source chains take part in matching.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use quotaguard_core::retry::ErrorClassification;
    ///
    /// let err = std::io::Error::other("RESOURCE_EXHAUSTED: try later");
    /// assert!(ErrorClassification::of(&err).is_transient());
    ///
    /// let err = std::io::Error::other("invalid argument");
    /// assert!(!ErrorClassification::of(&err).is_transient());
    /// ```
    pub fn of<E>(error: &E) -> Self
    where
        E: fmt::Display + fmt::Debug + ?Sized,
    {
        Self::from_text(&format!("{error}\n{error:?}"))
    }

    /// Classify raw error text.
    ///
    /// Matching is case-insensitive and substring-based: the text is transient
    /// if it contains any of [`TRANSIENT_MARKERS`].
    pub fn from_text(text: &str) -> Self {
        let text = text.to_lowercase();
        if TRANSIENT_MARKERS.iter().any(|marker| text.contains(marker)) {
            Self::Transient
        } else {
            Self::Permanent
        }
    }

    /// Whether a failure with this classification should be retried.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Decides whether an error of type `E` is transient.
///
/// Implemented by [`SubstringClassifier`] for any displayable error, and by
/// any `Fn(&E) -> ErrorClassification` closure, so callers with structured
/// error codes can tighten classification:
///
/// ```rust
/// use quotaguard_core::retry::{ErrorClassification, RetryPolicy, RetryingInvoker};
///
/// #[derive(Debug)]
/// struct Status(u16);
///
/// let invoker = RetryingInvoker::new(RetryPolicy::default()).with_classifier(|s: &Status| {
///     if s.0 == 429 {
///         ErrorClassification::Transient
///     } else {
///         ErrorClassification::Permanent
///     }
/// });
/// # let _ = invoker;
/// ```
pub trait Classifier<E: ?Sized> {
    /// Classify a single failure.
    fn classify(&self, error: &E) -> ErrorClassification;
}

/// Default classifier: loose substring matching over the error text.
///
/// Works across heterogeneous error shapes at the cost of possible false
/// positives (any text containing "429", e.g. "4290").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstringClassifier;

impl<E> Classifier<E> for SubstringClassifier
where
    E: fmt::Display + fmt::Debug + ?Sized,
{
    fn classify(&self, error: &E) -> ErrorClassification {
        ErrorClassification::of(error)
    }
}

impl<E, F> Classifier<E> for F
where
    E: ?Sized,
    F: Fn(&E) -> ErrorClassification,
{
    fn classify(&self, error: &E) -> ErrorClassification {
        self(error)
    }
}
