//! Configuration loader
//!
//! Loads a YAML document on top of a seeded [`Configuration`], applies
//! environment variable overrides, merges the global defaults and validates.
//! Priority: environment variables > file > seeded defaults

use std::env;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::document::ConfigDocument;
use crate::config::types::Configuration;
use crate::error::ConfigError;

/// Environment variable overriding `global.server.endpoint`
pub const ENV_SERVER_ENDPOINT: &str = "OTEL_FANOUT_SERVER_ENDPOINT";
/// Environment variable overriding `global.server.api_path`
pub const ENV_SERVER_API_PATH: &str = "OTEL_FANOUT_SERVER_API_PATH";
/// Environment variable overriding `global.server.mode`
pub const ENV_SERVER_MODE: &str = "OTEL_FANOUT_SERVER_MODE";
/// Environment variable overriding `global.server.insecure`
pub const ENV_SERVER_INSECURE: &str = "OTEL_FANOUT_SERVER_INSECURE";
/// Environment variable overriding `global.client.interval`
pub const ENV_CLIENT_INTERVAL: &str = "OTEL_FANOUT_CLIENT_INTERVAL";
/// Environment variable overriding `global.client.auth`
pub const ENV_CLIENT_AUTH: &str = "OTEL_FANOUT_CLIENT_AUTH";

impl Configuration {
    /// Load a YAML configuration file
    ///
    /// A file that cannot be read or decoded clears the success flag and is
    /// returned as an error; the configuration is not marked loaded. Otherwise
    /// the document is merged and validated and the configuration is marked
    /// loaded whatever the validation outcome, see [`Configuration::is_success`].
    ///
    /// The process environment is consulted after the file is applied:
    /// [`ENV_SERVER_ENDPOINT`], [`ENV_SERVER_API_PATH`], [`ENV_SERVER_MODE`],
    /// [`ENV_SERVER_INSECURE`], [`ENV_CLIENT_INTERVAL`] and [`ENV_CLIENT_AUTH`]
    /// override the matching global defaults before they are merged. Unset
    /// variables leave the file's values alone and unparseable ones are
    /// logged and ignored.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let span = self.span.clone();
        let _enter = span.enter();

        info!(
            config_path = %path.display(),
            "Loading configuration from YAML file"
        );

        let content = std::fs::read_to_string(path).map_err(|e| {
            warn!(
                config_path = %path.display(),
                error = %e,
                "Failed to read configuration file"
            );
            self.success = false;
            ConfigError::FileOpen {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        debug!(
            config_path = %path.display(),
            file_size_bytes = content.len(),
            "Read configuration file"
        );

        self.load_document(&content)
    }

    /// Load a YAML configuration from a string
    ///
    /// Same as [`Configuration::load_file`] minus the file read, including
    /// the `OTEL_FANOUT_*` environment overrides.
    pub fn load_str(&mut self, content: &str) -> Result<(), ConfigError> {
        let span = self.span.clone();
        let _enter = span.enter();
        self.load_document(content)
    }

    fn load_document(&mut self, content: &str) -> Result<(), ConfigError> {
        let document = ConfigDocument::from_yaml(content).map_err(|e| {
            warn!(error = %e, "Failed to parse YAML configuration");
            self.success = false;
            e
        })?;
        document.apply(self);

        debug!("Parsed YAML configuration successfully");

        self.apply_env_overrides();
        self.finish_loading();

        info!(
            success = self.success,
            clients = self.clients.len(),
            auths = self.auths.len(),
            metrics_enabled = self.servers.metrics.enabled,
            logs_enabled = self.servers.logs.enabled,
            traces_enabled = self.servers.traces.enabled,
            "Configuration loaded"
        );

        Ok(())
    }

    /// Apply environment variable overrides to the global defaults
    fn apply_env_overrides(&mut self) {
        // OTEL_FANOUT_SERVER_ENDPOINT
        if let Ok(endpoint) = env::var(ENV_SERVER_ENDPOINT) {
            debug!(
                env_var = ENV_SERVER_ENDPOINT,
                value = %endpoint,
                "Applying environment variable override"
            );
            self.global.server.endpoint = endpoint;
        }

        // OTEL_FANOUT_SERVER_API_PATH
        if let Ok(api_path) = env::var(ENV_SERVER_API_PATH) {
            debug!(
                env_var = ENV_SERVER_API_PATH,
                value = %api_path,
                "Applying environment variable override"
            );
            self.global.server.api_path = api_path;
        }

        // OTEL_FANOUT_SERVER_MODE
        if let Ok(mode) = env::var(ENV_SERVER_MODE) {
            debug!(
                env_var = ENV_SERVER_MODE,
                value = %mode,
                "Applying environment variable override"
            );
            self.global.server.mode = mode.to_lowercase();
        }

        // OTEL_FANOUT_SERVER_INSECURE
        if let Ok(insecure) = env::var(ENV_SERVER_INSECURE) {
            match insecure.parse::<bool>() {
                Ok(val) => {
                    debug!(
                        env_var = ENV_SERVER_INSECURE,
                        value = val,
                        "Applying environment variable override"
                    );
                    self.global.server.insecure = val;
                }
                Err(e) => {
                    warn!(
                        env_var = ENV_SERVER_INSECURE,
                        value = %insecure,
                        error = %e,
                        "Failed to parse environment variable, keeping current value"
                    );
                }
            }
        }

        // OTEL_FANOUT_CLIENT_INTERVAL
        if let Ok(interval) = env::var(ENV_CLIENT_INTERVAL) {
            match humantime::parse_duration(&interval) {
                Ok(duration) => {
                    debug!(
                        env_var = ENV_CLIENT_INTERVAL,
                        value = ?duration,
                        "Applying environment variable override"
                    );
                    self.global.client.interval = duration;
                }
                Err(e) => {
                    warn!(
                        env_var = ENV_CLIENT_INTERVAL,
                        value = %interval,
                        error = %e,
                        "Failed to parse environment variable, keeping current value"
                    );
                }
            }
        }

        // OTEL_FANOUT_CLIENT_AUTH
        if let Ok(auth) = env::var(ENV_CLIENT_AUTH) {
            debug!(
                env_var = ENV_CLIENT_AUTH,
                value = %auth,
                "Applying environment variable override"
            );
            self.global.client.auth = auth;
        }
    }
}
