//! Integration tests for environment variable overrides

mod common;

use common::write_config;
use otel_fanout::Configuration;
use otel_fanout::config::loader::{
    ENV_CLIENT_AUTH, ENV_CLIENT_INTERVAL, ENV_SERVER_API_PATH, ENV_SERVER_ENDPOINT,
    ENV_SERVER_INSECURE, ENV_SERVER_MODE,
};
use std::sync::Mutex;
use std::time::Duration;

// Mutex to serialize environment variable access across parallel tests
// Environment variables are process-wide, so parallel tests can interfere with each other
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ALL_VARS: [&str; 6] = [
    ENV_SERVER_ENDPOINT,
    ENV_SERVER_API_PATH,
    ENV_SERVER_MODE,
    ENV_SERVER_INSECURE,
    ENV_CLIENT_INTERVAL,
    ENV_CLIENT_AUTH,
];

/// Helper function to clear all override environment variables
fn clear_env_vars() {
    for var in ALL_VARS {
        // SAFETY: every test touching these variables holds ENV_MUTEX
        unsafe { std::env::remove_var(var) };
    }
}

fn set_var(key: &str, value: &str) {
    // SAFETY: every test touching these variables holds ENV_MUTEX
    unsafe { std::env::set_var(key, value) };
}

#[test]
fn test_env_overrides_file_globals() {
    let _guard = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    set_var(ENV_SERVER_ENDPOINT, "http://env-collector:4318");
    set_var(ENV_SERVER_API_PATH, "/v1/metrics");
    set_var(ENV_SERVER_MODE, "GRPC");
    set_var(ENV_SERVER_INSECURE, "false");
    set_var(ENV_CLIENT_INTERVAL, "45s");
    set_var(ENV_CLIENT_AUTH, "a1");

    let mut config = Configuration::new();
    config
        .load_str(
            r#"
global:
  server:
    endpoint: "http://file-collector:4318"
clients:
  - endpoint: "http://localhost:4317"
auths:
  - name: a1
    username: u
    password: p
"#,
        )
        .unwrap();

    clear_env_vars();

    let metrics = &config.servers().metrics;
    assert_eq!(metrics.endpoint.as_deref(), Some("http://env-collector:4318"));
    assert_eq!(metrics.api_path.as_deref(), Some("/v1/metrics"));
    assert_eq!(metrics.mode.as_deref(), Some("grpc"));
    assert_eq!(metrics.insecure, Some(false));

    let client = &config.clients()[0];
    assert_eq!(client.interval, Some(Duration::from_secs(45)));
    assert_eq!(client.auth.as_deref(), Some("a1"));
    assert!(config.is_success());
    assert!(config.report().defects().is_empty());
}

#[test]
fn test_env_does_not_override_explicit_kind_settings() {
    let _guard = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    set_var(ENV_SERVER_ENDPOINT, "http://env-collector:4318");

    let mut config = Configuration::new();
    config
        .load_str(
            r#"
server:
  logs:
    endpoint: "http://logs-collector:4318"
"#,
        )
        .unwrap();

    clear_env_vars();

    assert_eq!(
        config.servers().metrics.endpoint.as_deref(),
        Some("http://env-collector:4318")
    );
    assert_eq!(
        config.servers().logs.endpoint.as_deref(),
        Some("http://logs-collector:4318")
    );
}

#[test]
fn test_unparseable_env_values_are_ignored() {
    let _guard = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    set_var(ENV_SERVER_INSECURE, "maybe");
    set_var(ENV_CLIENT_INTERVAL, "whenever");

    let mut config = Configuration::new();
    config
        .load_str(
            r#"
global:
  client:
    interval: 3s
clients:
  - endpoint: "http://localhost:4317"
"#,
        )
        .unwrap();

    clear_env_vars();

    assert_eq!(config.servers().metrics.insecure, Some(true));
    assert_eq!(config.clients()[0].interval, Some(Duration::from_secs(3)));
}

#[test]
fn test_load_file_consults_environment() {
    let _guard = ENV_MUTEX.lock().unwrap();
    clear_env_vars();

    let (_temp_dir, config_file) = write_config(
        r#"
global:
  server:
    endpoint: "http://file-collector:4318"
    api_path: "/file"
"#,
    );
    set_var(ENV_SERVER_ENDPOINT, "http://env-collector:4318");

    let mut config = Configuration::new();
    config.load_file(&config_file).unwrap();

    clear_env_vars();

    let logs = &config.servers().logs;
    assert_eq!(logs.endpoint.as_deref(), Some("http://env-collector:4318"));
    assert_eq!(logs.api_path.as_deref(), Some("/file"));
}
