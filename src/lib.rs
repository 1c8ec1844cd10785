//! OTLP Fan-out Library
//!
//! Loads a YAML document describing telemetry servers, clients and
//! credentials, fills unspecified settings from global defaults, validates
//! the result and builds one OpenTelemetry meter and logger provider per
//! client.
//!
//! # Features
//!
//! - YAML configuration overlaid on hardcoded defaults
//! - Environment variable overrides for the global defaults
//! - Validation that reports every problem instead of stopping at the first
//! - OTLP over HTTP or gRPC, with or without certificate verification
//!
//! # Example
//!
//! ```no_run
//! use otel_fanout::Configuration;
//!
//! # fn example() -> Result<(), otel_fanout::FanoutError> {
//! let mut config = Configuration::new();
//! config.load_file("telemetry.yaml")?;
//!
//! let meter_providers = config.meter_providers("checkout")?;
//! let logger_providers = config.logger_providers("checkout")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod otlp;

// Re-export public API
pub use config::{
    AuthRecord, ClientSettings, Configuration, ConfigurationBuilder, Defect, ServerKind,
    ServerSettings, Severity, TransportMode, ValidationReport,
};
pub use error::{ConfigError, FanoutError, ProviderError};

// Initialize tracing subscriber for structured logging
use tracing_subscriber::EnvFilter;

/// Initialize structured logging
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}

/// Initialize structured logging with JSON output
pub fn init_json_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initialization_is_idempotent() {
        init_json_logging();
        // A global subscriber is already set; both must return quietly
        init_logging();
        init_json_logging();
    }
}
