//! Error types for the telemetry fan-out library
//!
//! Only loading failures and provider generation failures surface as errors.
//! Validation problems never do: they are collected in a
//! [`ValidationReport`](crate::config::ValidationReport) and logged.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ServerKind;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum FanoutError {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provider generation errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors that abort loading a configuration document
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be opened or read
    #[error("Failed to read config file {}: {source}", path.display())]
    FileOpen {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML for the configuration schema
    #[error("Failed to parse YAML: {0}")]
    Decode(#[from] serde_yaml::Error),
}

/// Errors raised while generating providers from a loaded configuration
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Providers were requested before a document was loaded
    #[error("configuration not loaded")]
    NotLoaded,

    /// The server kind is disabled in the configuration
    #[error("{0} disabled")]
    Disabled(ServerKind),

    /// The merged server settings cannot be turned into an exporter target
    #[error("invalid {kind} exporter target: {reason}")]
    InvalidTarget {
        /// Server kind whose settings are unusable
        kind: ServerKind,
        /// What is wrong with them
        reason: String,
    },

    /// The OTLP exporter could not be constructed
    #[error("failed to initialize {kind} exporter: {reason}")]
    Exporter {
        /// Server kind the exporter was built for
        kind: ServerKind,
        /// Error reported by the exporter builder
        reason: String,
    },
}
