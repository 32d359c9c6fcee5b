//! Saturation handling end to end, against a simulated remote API.
//!
//! 1. A chat call that recovers after the shared quota frees up
//! 2. An image call that stays saturated and surfaces a failure report
//! 3. A verified switch to private credentials
//!
//! Run with:
//! ```bash
//! RUST_LOG=quotaguard=debug,quotaguard_core=debug cargo run -p quotaguard --example saturation
//! ```

use quotaguard::{Client, Error, FailureReport, RetryPolicy, SwitchOutcome};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const EXHAUSTED: &str =
    r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;

/// Remote API stand-in: saturated for the shared key until `free_after` calls.
struct SimulatedApi {
    calls: AtomicU32,
    free_after: u32,
}

impl SimulatedApi {
    async fn generate(&self, client: &Client, prompt: &str) -> quotaguard::Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let private = client.api_key()?.expose_secret() == "private-key";
        if !private && call < self.free_after {
            return Err(Error::from_response(429, EXHAUSTED));
        }
        Ok(format!("response to {prompt:?}"))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::builder()
        .api_key("shared-key")
        .retry(
            RetryPolicy::builder()
                .max_retries(3)
                .initial_delay(Duration::from_millis(200))
                .build(),
        )
        .build()?;

    println!("=== 1. Recovering chat call ===");
    let api = SimulatedApi {
        calls: AtomicU32::new(0),
        free_after: 2,
    };
    let text = client
        .invoke(|c| {
            let api = &api;
            async move { api.generate(&c, "zoning outlook").await }
        })
        .await?;
    println!("ok after {} calls: {text}\n", api.calls.load(Ordering::SeqCst));

    println!("=== 2. Image call on a saturated node ===");
    let api = SimulatedApi {
        calls: AtomicU32::new(0),
        free_after: u32::MAX,
    };
    let err = client
        .invoke(|c| {
            let api = &api;
            async move { api.generate(&c, "a lighthouse at dusk").await }
        })
        .await
        .unwrap_err();
    let report = FailureReport::from(&err);
    println!("{}\n", serde_json::to_string_pretty(&report)?);

    if report.offers_credential_switch() {
        println!("=== 3. Switching to private credentials ===");
        let outcome = client
            .switch_credentials("private-key", |c| {
                let api = &api;
                async move { api.generate(&c, "ping").await }
            })
            .await;
        match outcome {
            SwitchOutcome::Verified(client) => {
                let reply = client
                    .invoke(|c| {
                        let api = &api;
                        async move { api.generate(&c, "a lighthouse at dusk").await }
                    })
                    .await?;
                println!("verified: {reply}")
            }
            other => println!("switch not adopted: {:?}", other.error()),
        }
    }

    Ok(())
}
