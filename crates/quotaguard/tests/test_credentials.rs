//! Credential switching after saturation
//!
//! The new key is adopted only once a probe call made with it succeeds.

use assert_matches::assert_matches;
use quotaguard::{Client, Error, SwitchOutcome};
use secrecy::ExposeSecret;

mod common;
use common::{EXHAUSTED_BODY, FakeService, INVALID_ARGUMENT_BODY, test_api_key};

#[tokio::test]
async fn test_switch_verified() {
    let shared = Client::new(test_api_key());
    let service = &FakeService::new([(200, "pong")]);

    let outcome = shared
        .switch_credentials("private-key", |c| async move { service.call(&c).await })
        .await;

    assert!(outcome.is_verified());
    let private = outcome.into_client().unwrap();
    assert_eq!(private.api_key().unwrap().expose_secret(), "private-key");
    assert_eq!(service.keys(), vec!["private-key".to_string()]);

    // the shared client keeps its own key
    assert_eq!(shared.api_key().unwrap().expose_secret(), test_api_key());
}

#[tokio::test]
async fn test_switch_still_saturated() {
    let shared = Client::new(test_api_key());
    let service = &FakeService::new([(429, EXHAUSTED_BODY), (200, "too late")]);

    let outcome = shared
        .switch_credentials("private-key", |c| async move { service.call(&c).await })
        .await;

    assert_matches!(outcome, SwitchOutcome::StillSaturated { error: Error::RateLimit { .. } });
    // the probe is a single attempt
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_switch_rejected() {
    let shared = Client::new(test_api_key());
    let service = &FakeService::new([(400, INVALID_ARGUMENT_BODY)]);

    let outcome = shared
        .switch_credentials("bad-key", |c| async move { service.call(&c).await })
        .await;

    assert!(!outcome.is_verified());
    assert_matches!(outcome.error(), Some(Error::InvalidRequest(_)));
    assert!(outcome.into_client().is_none());
}

#[tokio::test]
async fn test_switch_keeps_policies() {
    let shared = Client::builder()
        .api_key(test_api_key())
        .base_url("https://generativelanguage.example.com")
        .retry(quotaguard::RetryPolicy::builder().max_retries(1).build())
        .build()
        .unwrap();

    let outcome = shared
        .switch_credentials("private-key", |_| async { Ok::<_, Error>(()) })
        .await;

    let private = outcome.into_client().unwrap();
    assert_eq!(private.base_url(), shared.base_url());
    assert_eq!(private.retry_policy().max_retries(), 1);
}
