//! OpenTelemetry Protocol (OTLP) module
//!
//! Builds OTLP exporters for each enabled server kind and the per-client
//! meter and logger providers wired to them.

pub mod exporter;
pub mod provider;

pub use exporter::ExporterTarget;
pub use provider::{SERVICE_NAME, client_resource};
