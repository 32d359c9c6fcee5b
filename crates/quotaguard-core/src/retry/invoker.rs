//! Retrying invocation of remote operations.

use super::classify::{Classifier, SubstringClassifier};
use super::policy::RetryPolicy;
use super::strategy::BackoffStrategy;
use std::fmt;
use std::future::Future;

/// Runs an operation, retrying transient failures with backoff.
///
/// Attempts are strictly sequential: a new attempt starts only after the
/// previous one failed and its backoff delay elapsed. Successes return
/// immediately. Permanent failures, and transient failures once the budget
/// is spent, return the operation's **original error** unchanged.
///
/// The invoker holds no mutable state, so one instance can serve any number
/// of concurrent invocations. Dropping the future returned by
/// [`invoke`](Self::invoke) cancels the pending backoff sleep and no further
/// attempts are made.
///
/// # Examples
///
/// ```rust
/// use quotaguard_core::retry::{RetryPolicy, RetryingInvoker};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), std::io::Error> {
/// let invoker = RetryingInvoker::new(
///     RetryPolicy::builder()
///         .max_retries(3)
///         .initial_delay(Duration::from_millis(10))
///         .build(),
/// );
///
/// let calls = AtomicU32::new(0);
/// let value = invoker
///     .invoke(|| {
///         let call = calls.fetch_add(1, Ordering::SeqCst);
///         async move {
///             if call < 2 {
///                 Err(std::io::Error::other("429 RESOURCE_EXHAUSTED"))
///             } else {
///                 Ok("answer")
///             }
///         }
///     })
///     .await?;
///
/// assert_eq!(value, "answer");
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct RetryingInvoker<S = RetryPolicy, C = SubstringClassifier> {
    strategy: S,
    classifier: C,
}

impl<S: fmt::Debug, C> fmt::Debug for RetryingInvoker<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingInvoker")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl<S: BackoffStrategy> RetryingInvoker<S> {
    /// Create an invoker with the default substring classifier.
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            classifier: SubstringClassifier,
        }
    }
}

impl<S: BackoffStrategy, C> RetryingInvoker<S, C> {
    /// Replace the classifier that decides which failures are transient.
    pub fn with_classifier<C2>(self, classifier: C2) -> RetryingInvoker<S, C2> {
        RetryingInvoker {
            strategy: self.strategy,
            classifier,
        }
    }

    /// The backoff strategy in use.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Run `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent.
    ///
    /// `operation` is called once per attempt and must build a fresh future
    /// each time.
    pub async fn invoke<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Classifier<E>,
    {
        let mut attempt = 0;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !self.classifier.classify(&err).is_transient() {
                return Err(err);
            }

            let Some(delay) = self.strategy.next_delay(attempt) else {
                return Err(err);
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                attempts_left = self.strategy.max_retries().saturating_sub(attempt),
                "remote capacity saturated, backing off"
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Run `operation` under `policy` with the default substring classifier.
///
/// Shorthand for `RetryingInvoker::new(policy.clone()).invoke(operation)`.
pub async fn invoke<F, Fut, T, E>(operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display + fmt::Debug,
{
    RetryingInvoker::new(policy.clone()).invoke(operation).await
}
