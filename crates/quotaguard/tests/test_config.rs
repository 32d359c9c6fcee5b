//! Configuration loading from the environment and TOML files

use quotaguard::{Client, ClientConfig, Error};
use secrecy::ExposeSecret;
use std::io::Write;
use std::time::Duration;

const ALL_VARS: [&str; 7] = [
    "GENAI_API_KEY",
    "GENAI_BASE_URL",
    "GENAI_MAX_RETRIES",
    "GENAI_INITIAL_DELAY_MS",
    "GENAI_BACKOFF_MULTIPLIER",
    "GENAI_MAX_DELAY_MS",
    "GENAI_POLL_INTERVAL_MS",
];

#[test]
fn test_from_env_defaults_when_unset() {
    temp_env::with_vars_unset(ALL_VARS, || {
        let config = ClientConfig::from_env().unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.retry.max_retries(), 4);
        assert_eq!(config.retry.initial_delay(), Duration::from_millis(1500));
        assert_eq!(config.retry.backoff_multiplier(), 2.0);
    });
}

#[test]
fn test_from_env_reads_all_values() {
    temp_env::with_vars(
        [
            ("GENAI_API_KEY", Some("env-key")),
            ("GENAI_BASE_URL", Some("https://genai.example.com")),
            ("GENAI_MAX_RETRIES", Some("2")),
            ("GENAI_INITIAL_DELAY_MS", Some("1000")),
            ("GENAI_BACKOFF_MULTIPLIER", Some("3")),
            ("GENAI_MAX_DELAY_MS", Some("5000")),
            ("GENAI_POLL_INTERVAL_MS", Some("250")),
        ],
        || {
            let config = ClientConfig::from_env().unwrap();
            assert_eq!(config.api_key.unwrap().expose_secret(), "env-key");
            assert_eq!(config.base_url.as_deref(), Some("https://genai.example.com"));
            assert_eq!(config.retry.max_retries(), 2);
            assert_eq!(config.retry.initial_delay(), Duration::from_secs(1));
            assert_eq!(config.retry.backoff_multiplier(), 3.0);
            assert_eq!(config.retry.max_delay(), Some(Duration::from_secs(5)));
            assert_eq!(config.poll.interval(), Duration::from_millis(250));
        },
    );
}

#[test]
fn test_from_env_rejects_garbage() {
    temp_env::with_vars_unset(ALL_VARS, || {
        temp_env::with_var("GENAI_MAX_RETRIES", Some("lots"), || {
            let err = ClientConfig::from_env().unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)));
        });
    });
}

#[test]
fn test_from_env_rejects_flat_multiplier() {
    temp_env::with_vars_unset(ALL_VARS, || {
        temp_env::with_var("GENAI_BACKOFF_MULTIPLIER", Some("1"), || {
            let err = ClientConfig::from_env().unwrap_err();
            assert!(matches!(err, Error::Policy(_)));
        });
    });
}

#[test]
fn test_client_from_env() {
    temp_env::with_vars_unset(ALL_VARS, || {
        temp_env::with_var("GENAI_API_KEY", Some("env-key"), || {
            let client = Client::from_env().unwrap();
            assert_eq!(client.api_key().unwrap().expose_secret(), "env-key");
        });
    });
}

#[test]
fn test_from_dotenv_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(&path, "GENAI_API_KEY=dotenv-key\nGENAI_MAX_RETRIES=6\n").unwrap();

    temp_env::with_vars_unset(ALL_VARS, || {
        let config = ClientConfig::from_dotenv_path(&path).unwrap();
        assert_eq!(config.api_key.unwrap().expose_secret(), "dotenv-key");
        assert_eq!(config.retry.max_retries(), 6);
    });
}

#[test]
fn test_dotenv_keeps_existing_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(&path, "GENAI_API_KEY=dotenv-key\nGENAI_MAX_RETRIES=6\n").unwrap();

    temp_env::with_vars_unset(ALL_VARS, || {
        temp_env::with_var("GENAI_API_KEY", Some("shell-key"), || {
            let config = ClientConfig::from_dotenv_path(&path).unwrap();
            assert_eq!(config.api_key.unwrap().expose_secret(), "shell-key");
            assert_eq!(config.retry.max_retries(), 6);
        });
    });
}

#[test]
fn test_from_dotenv_path_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClientConfig::from_dotenv_path(dir.path().join(".env")).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
api_key = "file-key"
base_url = "https://genai.example.com"

[retry]
max_retries = 3
initial_delay_ms = 1000
backoff_multiplier = 2.0
max_delay_ms = 8000

[poll]
interval_ms = 8000
max_polls = 75
"#
    )
    .unwrap();

    let config = ClientConfig::from_file(file.path()).unwrap();
    assert_eq!(config.api_key.as_ref().unwrap().expose_secret(), "file-key");
    assert_eq!(config.retry.max_retries(), 3);
    assert_eq!(config.retry.max_delay(), Some(Duration::from_secs(8)));
    assert_eq!(config.poll.max_polls(), Some(75));

    let client = Client::from_config(config).unwrap();
    assert_eq!(client.base_url(), Some("https://genai.example.com"));
}

#[test]
fn test_from_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClientConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_from_file_rejects_zero_poll_interval() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[poll]\ninterval_ms = 0").unwrap();

    let err = ClientConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, Error::Policy(_)));
}
