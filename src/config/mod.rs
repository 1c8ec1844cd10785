//! Configuration module
//!
//! Provides the document model, YAML loading with environment variable
//! overrides, default merging and validation.

mod document;
pub mod loader;
pub mod merge;
pub mod types;
pub mod validate;

pub use types::{
    AuthRecord, ClientSettings, Configuration, ConfigurationBuilder, GlobalClientDefaults,
    GlobalDefaults, GlobalServerDefaults, ServerKind, ServerKinds, ServerSettings, TransportMode,
    UnknownTransportMode,
};
pub use validate::{Defect, Severity, ValidationReport};
