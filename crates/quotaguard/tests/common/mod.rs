//! Common test utilities and helpers

use quotaguard::{Client, Error, Result};
use secrecy::ExposeSecret;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Error envelope returned by the remote API when the shared quota is spent
#[allow(dead_code)]
pub const EXHAUSTED_BODY: &str = r#"{
    "error": {
        "code": 429,
        "message": "Resource has been exhausted (e.g. check quota).",
        "status": "RESOURCE_EXHAUSTED"
    }
}"#;

/// Error envelope for a malformed request
#[allow(dead_code)]
pub const INVALID_ARGUMENT_BODY: &str = r#"{
    "error": {
        "code": 400,
        "message": "Request contains an invalid argument.",
        "status": "INVALID_ARGUMENT"
    }
}"#;

/// Create a test API key
#[allow(dead_code)]
pub fn test_api_key() -> String {
    "test-key-0123456789".to_string()
}

/// A scripted stand-in for the remote API.
///
/// Each call pops the next `(status, body)` pair; 200 succeeds with the body
/// as payload, anything else fails through `Error::from_response`. Once the
/// script runs out every call succeeds with `"ok"`.
#[allow(dead_code)]
pub struct FakeService {
    script: Mutex<VecDeque<(u16, &'static str)>>,
    calls: AtomicU32,
    keys: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeService {
    pub fn new(script: impl IntoIterator<Item = (u16, &'static str)>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicU32::new(0),
            keys: Mutex::new(Vec::new()),
        }
    }

    /// A service that is saturated for every call.
    pub fn saturated() -> Self {
        Self::new(std::iter::repeat_n((429, EXHAUSTED_BODY), 64))
    }

    pub async fn call(&self, client: &Client) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = client.api_key()?.expose_secret().to_string();
        self.keys.lock().unwrap().push(key);

        match self.script.lock().unwrap().pop_front() {
            Some((200, body)) => Ok(body.to_string()),
            Some((status, body)) => Err(Error::from_response(status, body)),
            None => Ok("ok".to_string()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}
