//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! building a client from it.

use relay_domain::RelayError;
use relay_infra::{config, ApiClient};
use tempfile::TempDir;

#[test]
fn test_load_config_from_json_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("relay.json");
    std::fs::write(
        &path,
        r#"{
            "base_url": "https://api.example.com/v2",
            "timeout_ms": 10000,
            "csrf_header": "X-XSRF-TOKEN",
            "auth": {
                "refresh_path": "/token/refresh/",
                "auth_path_markers": ["/token/", "/auth/"]
            },
            "retry": { "max_retries": 2, "base_delay_ms": 500, "max_delay_ms": 4000 }
        }"#,
    )
    .expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("Failed to load config from JSON");

    assert_eq!(config.base_url, "https://api.example.com/v2");
    assert_eq!(config.timeout_ms, 10000);
    assert_eq!(config.csrf_header, "X-XSRF-TOKEN");
    assert_eq!(config.auth.refresh_path, "/token/refresh/");
    assert!(config.auth.is_auth_endpoint("/token/refresh/"));
    assert_eq!(config.auth.login_redirect, "/login");
    assert_eq!(config.retry.max_retries, 2);

    assert!(ApiClient::new(config).is_ok());
}

#[test]
fn test_load_config_with_minimal_fields() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "base_url = \"http://127.0.0.1:8000/api\"\n").expect("Failed to write");

    let config = config::load_from_file(Some(path)).expect("Failed to load minimal config");

    assert_eq!(config.timeout_ms, 30_000);
    assert!(!config.log_requests);
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.auth.refresh_path, "/auth/refresh/");
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/relay.json".into()));

    match result {
        Err(RelayError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("relay.json");
    std::fs::write(&path, r#"{ "base_url": "#).expect("Failed to write");

    match config::load_from_file(Some(path)) {
        Err(RelayError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}
