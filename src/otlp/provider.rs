//! Per-client provider generation
//!
//! Every client of a loaded configuration gets its own meter and logger
//! provider. All providers of one kind export to the same server target; each
//! carries the client's labels and the service name as resource attributes.

use std::collections::HashMap;

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use tracing::{error, info, warn};

use crate::config::{ClientSettings, Configuration, ServerKind};
use crate::error::ProviderError;
use crate::otlp::exporter::ExporterTarget;

/// Resource attribute carrying the logical service name
pub const SERVICE_NAME: &str = "service.name";

/// Resource for one client: its labels plus `service.name`
pub fn client_resource(client: &ClientSettings, service_name: &str) -> Resource {
    let mut attributes: Vec<KeyValue> = client
        .labels
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
        .collect();
    attributes.push(KeyValue::new(SERVICE_NAME, service_name.to_string()));

    Resource::builder_empty().with_attributes(attributes).build()
}

impl Configuration {
    /// Build one meter provider per client, keyed by client endpoint
    ///
    /// Each provider reads periodically at the client's merged interval.
    /// Fails (and logs) when the configuration is not loaded, metrics are
    /// disabled or an exporter cannot be built.
    pub fn meter_providers(
        &self,
        service_name: &str,
    ) -> Result<HashMap<String, SdkMeterProvider>, ProviderError> {
        let span = self.span.clone();
        let _enter = span.enter();

        let target = self.exporter_target(ServerKind::Metrics)?;
        let mut providers = HashMap::new();
        for (endpoint, client) in self.addressable_clients() {
            let exporter = target.metric_exporter().inspect_err(|e| {
                error!(
                    kind = %target.kind,
                    error = %e,
                    "failed to initialize metrics exporter"
                );
            })?;
            let reader = PeriodicReader::builder(exporter)
                .with_interval(client.interval.unwrap_or(self.global.client.interval))
                .build();
            let provider = SdkMeterProvider::builder()
                .with_resource(client_resource(client, service_name))
                .with_reader(reader)
                .build();
            providers.insert(endpoint.to_string(), provider);
        }

        info!(
            service_name,
            url = %target.url,
            mode = %target.mode,
            providers = providers.len(),
            "Generated meter providers"
        );
        Ok(providers)
    }

    /// Build one logger provider per client, keyed by client endpoint
    ///
    /// Records are exported synchronously through a simple processor.
    /// Fails (and logs) like [`Configuration::meter_providers`].
    pub fn logger_providers(
        &self,
        service_name: &str,
    ) -> Result<HashMap<String, SdkLoggerProvider>, ProviderError> {
        let span = self.span.clone();
        let _enter = span.enter();

        let target = self.exporter_target(ServerKind::Logs)?;
        let mut providers = HashMap::new();
        for (endpoint, client) in self.addressable_clients() {
            let exporter = target.log_exporter().inspect_err(|e| {
                error!(
                    kind = %target.kind,
                    error = %e,
                    "failed to initialize logger provider"
                );
            })?;
            let provider = SdkLoggerProvider::builder()
                .with_resource(client_resource(client, service_name))
                .with_simple_exporter(exporter)
                .build();
            providers.insert(endpoint.to_string(), provider);
        }

        info!(
            service_name,
            url = %target.url,
            mode = %target.mode,
            providers = providers.len(),
            "Generated logger providers"
        );
        Ok(providers)
    }

    fn exporter_target(&self, kind: ServerKind) -> Result<ExporterTarget, ProviderError> {
        if !self.is_loaded() {
            error!(kind = %kind, "configuration not loaded");
            return Err(ProviderError::NotLoaded);
        }

        let settings = self.servers.get(kind);
        if !settings.enabled {
            match kind {
                ServerKind::Logs => error!(kind = %kind, "{kind} disabled"),
                _ => info!(kind = %kind, "{kind} disabled"),
            }
            return Err(ProviderError::Disabled(kind));
        }

        ExporterTarget::resolve(kind, settings).inspect_err(|e| {
            error!(kind = %kind, error = %e, "invalid exporter target");
        })
    }

    /// Clients that have an endpoint to key their providers by
    fn addressable_clients(&self) -> impl Iterator<Item = (&str, &ClientSettings)> {
        self.clients.iter().filter_map(|client| match client.endpoint.as_deref() {
            Some(endpoint) => Some((endpoint, client)),
            None => {
                warn!("skipping client without endpoint");
                None
            }
        })
    }
}
