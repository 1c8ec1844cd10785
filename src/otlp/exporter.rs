//! OTLP exporter construction
//!
//! Resolves a server kind's merged settings into an [`ExporterTarget`] and
//! builds opentelemetry-otlp exporters from it, selecting the transport from
//! the mode and certificate handling from the insecure flag.

use opentelemetry_otlp::{
    LogExporter, MetricExporter, Protocol, WithExportConfig, WithHttpConfig, WithTonicConfig,
};
use std::thread;
use tokio::runtime::Handle;
use tonic::transport::ClientTlsConfig;
use tracing::debug;

use crate::config::{ServerKind, ServerSettings, TransportMode};
use crate::error::ProviderError;

/// Where and how one server kind's telemetry is exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterTarget {
    /// Server kind
    pub kind: ServerKind,
    /// Endpoint with the API path appended
    pub url: String,
    /// Transport
    pub mode: TransportMode,
    /// Skip certificate verification (http) or TLS configuration (grpc)
    pub insecure: bool,
}

impl ExporterTarget {
    /// Resolve merged server settings
    pub fn resolve(kind: ServerKind, settings: &ServerSettings) -> Result<Self, ProviderError> {
        let endpoint = settings
            .endpoint
            .as_deref()
            .ok_or_else(|| ProviderError::InvalidTarget {
                kind,
                reason: "endpoint is not set".to_string(),
            })?;
        let api_path = settings.api_path.as_deref().unwrap_or_default();
        let mode = settings
            .mode
            .as_deref()
            .unwrap_or_default()
            .parse::<TransportMode>()
            .map_err(|e| ProviderError::InvalidTarget {
                kind,
                reason: e.to_string(),
            })?;

        Ok(Self {
            kind,
            url: format!("{endpoint}{api_path}"),
            mode,
            insecure: settings.insecure.unwrap_or(false),
        })
    }

    /// Build a metrics exporter for this target
    ///
    /// The http transport is built on a plain thread when called from inside
    /// a tokio runtime. The grpc transport requires one and fails with
    /// [`ProviderError::Exporter`] outside of it.
    pub fn metric_exporter(&self) -> Result<MetricExporter, ProviderError> {
        debug!(
            kind = %self.kind,
            url = %self.url,
            mode = %self.mode,
            insecure = self.insecure,
            "Building metric exporter"
        );
        match self.mode {
            TransportMode::Http => {
                let target = self.clone();
                off_runtime(self.kind, move || {
                    MetricExporter::builder()
                        .with_http()
                        .with_endpoint(&target.url)
                        .with_protocol(Protocol::HttpBinary)
                        .with_http_client(target.http_client()?)
                        .build()
                        .map_err(|e| target.exporter_error(e))
                })
            }
            TransportMode::Grpc => {
                self.require_runtime()?;
                let builder = MetricExporter::builder()
                    .with_tonic()
                    .with_endpoint(&self.url);
                let exporter = if self.insecure {
                    builder.build()
                } else {
                    builder.with_tls_config(tls_config()).build()
                };
                exporter.map_err(|e| self.exporter_error(e))
            }
        }
    }

    /// Build a logs exporter for this target
    pub fn log_exporter(&self) -> Result<LogExporter, ProviderError> {
        debug!(
            kind = %self.kind,
            url = %self.url,
            mode = %self.mode,
            insecure = self.insecure,
            "Building log exporter"
        );
        match self.mode {
            TransportMode::Http => {
                let target = self.clone();
                off_runtime(self.kind, move || {
                    LogExporter::builder()
                        .with_http()
                        .with_endpoint(&target.url)
                        .with_protocol(Protocol::HttpBinary)
                        .with_http_client(target.http_client()?)
                        .build()
                        .map_err(|e| target.exporter_error(e))
                })
            }
            TransportMode::Grpc => {
                self.require_runtime()?;
                let builder = LogExporter::builder().with_tonic().with_endpoint(&self.url);
                let exporter = if self.insecure {
                    builder.build()
                } else {
                    builder.with_tls_config(tls_config()).build()
                };
                exporter.map_err(|e| self.exporter_error(e))
            }
        }
    }

    fn http_client(&self) -> Result<reqwest::blocking::Client, ProviderError> {
        reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(self.insecure)
            .build()
            .map_err(|e| self.exporter_error(e))
    }

    // tonic channels are spawned onto the current tokio reactor
    fn require_runtime(&self) -> Result<(), ProviderError> {
        Handle::try_current()
            .map(|_| ())
            .map_err(|_| self.exporter_error("grpc transport requires a tokio runtime"))
    }

    fn exporter_error(&self, error: impl std::fmt::Display) -> ProviderError {
        ProviderError::Exporter {
            kind: self.kind,
            reason: error.to_string(),
        }
    }
}

fn tls_config() -> ClientTlsConfig {
    ClientTlsConfig::new().with_enabled_roots()
}

/// Run `build` on its own thread when the caller is inside a tokio runtime.
///
/// The blocking reqwest client drives its own runtime and must not be built
/// on a runtime worker.
fn off_runtime<T, F>(kind: ServerKind, build: F) -> Result<T, ProviderError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProviderError> + Send + 'static,
{
    if Handle::try_current().is_err() {
        return build();
    }
    thread::spawn(build)
        .join()
        .unwrap_or_else(|_| {
            Err(ProviderError::Exporter {
                kind,
                reason: "exporter construction thread panicked".to_string(),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_appends_api_path() {
        let settings = ServerSettings::enabled()
            .with_endpoint("http://collector:4318")
            .with_api_path("/v1/metrics")
            .with_insecure(true)
            .with_mode("http");

        let target = ExporterTarget::resolve(ServerKind::Metrics, &settings).unwrap();

        assert_eq!(target.url, "http://collector:4318/v1/metrics");
        assert_eq!(target.mode, TransportMode::Http);
        assert!(target.insecure);
    }

    #[test]
    fn test_resolve_rejects_unknown_mode() {
        let settings = ServerSettings::enabled()
            .with_endpoint("http://collector:4318")
            .with_mode("udp");

        let result = ExporterTarget::resolve(ServerKind::Logs, &settings);

        assert!(matches!(
            result,
            Err(ProviderError::InvalidTarget {
                kind: ServerKind::Logs,
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_requires_endpoint() {
        let settings = ServerSettings::enabled().with_mode("grpc");
        assert!(ExporterTarget::resolve(ServerKind::Metrics, &settings).is_err());
    }

    #[test]
    fn test_http_exporters_build_without_connecting() {
        let target = ExporterTarget {
            kind: ServerKind::Metrics,
            url: "https://127.0.0.1:1/v1/metrics".to_string(),
            mode: TransportMode::Http,
            insecure: true,
        };

        assert!(target.metric_exporter().is_ok());
        assert!(target.log_exporter().is_ok());
    }

    #[test]
    fn test_grpc_exporters_need_runtime() {
        let target = ExporterTarget {
            kind: ServerKind::Logs,
            url: "http://127.0.0.1:1".to_string(),
            mode: TransportMode::Grpc,
            insecure: true,
        };

        match target.log_exporter() {
            Err(ProviderError::Exporter { kind, reason }) => {
                assert_eq!(kind, ServerKind::Logs);
                assert!(reason.contains("tokio runtime"));
            }
            other => panic!("Expected Exporter error, got {:?}", other.map(|_| ())),
        }
        assert!(target.metric_exporter().is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_http_exporters_build_inside_runtime() {
        let target = ExporterTarget {
            kind: ServerKind::Metrics,
            url: "https://127.0.0.1:1/v1/metrics".to_string(),
            mode: TransportMode::Http,
            insecure: false,
        };

        assert!(target.metric_exporter().is_ok());
        assert!(target.log_exporter().is_ok());
    }
}
