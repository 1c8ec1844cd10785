//! Configuration type definitions
//!
//! Defines the document model: global defaults, per-kind server settings,
//! per-client settings and authentication records, plus the [`Configuration`]
//! root that owns them together with its lifecycle flags.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::validate::ValidationReport;

/// Transport used to reach a telemetry server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// OTLP over HTTP with binary protobuf payloads
    Http,
    /// OTLP over gRPC
    Grpc,
}

impl TransportMode {
    /// Name of the mode as written in the document
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Grpc => "grpc",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `mode` value other than `http` or `grpc`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported transport mode {0:?} (expected \"http\" or \"grpc\")")]
pub struct UnknownTransportMode(pub String);

impl FromStr for TransportMode {
    type Err = UnknownTransportMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "grpc" => Ok(Self::Grpc),
            other => Err(UnknownTransportMode(other.to_string())),
        }
    }
}

/// Category of telemetry with its own server settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerKind {
    /// Metrics server
    Metrics,
    /// Logs server
    Logs,
    /// Traces server
    Traces,
}

impl ServerKind {
    /// All kinds in the order they are merged and validated
    pub const ALL: [ServerKind; 3] = [Self::Metrics, Self::Logs, Self::Traces];

    /// Lowercase name used in documents and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Logs => "logs",
            Self::Traces => "traces",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one server kind
///
/// Every field except `enabled` distinguishes "not specified" (`None`) from an
/// explicit value, so that merging only fills what the document left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSettings {
    /// Whether providers are generated for this kind
    pub enabled: bool,
    /// Base URL of the server
    pub endpoint: Option<String>,
    /// Path appended verbatim to `endpoint`
    pub api_path: Option<String>,
    /// Skip certificate verification (http) or TLS altogether (grpc)
    pub insecure: Option<bool>,
    /// Transport mode, `"http"` or `"grpc"`
    pub mode: Option<String>,
}

impl ServerSettings {
    /// Enabled settings with every optional field unset
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Disabled settings with every optional field unset
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Set the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API path
    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = Some(api_path.into());
        self
    }

    /// Set the insecure flag
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = Some(insecure);
        self
    }

    /// Set the transport mode
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

/// Server settings for every kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKinds {
    /// Metrics server (enabled by default)
    pub metrics: ServerSettings,
    /// Logs server (enabled by default)
    pub logs: ServerSettings,
    /// Traces server (disabled by default)
    pub traces: ServerSettings,
}

impl Default for ServerKinds {
    fn default() -> Self {
        Self {
            metrics: ServerSettings::enabled(),
            logs: ServerSettings::enabled(),
            traces: ServerSettings::disabled(),
        }
    }
}

impl ServerKinds {
    /// Settings for `kind`
    pub fn get(&self, kind: ServerKind) -> &ServerSettings {
        match kind {
            ServerKind::Metrics => &self.metrics,
            ServerKind::Logs => &self.logs,
            ServerKind::Traces => &self.traces,
        }
    }

    /// Mutable settings for `kind`
    pub fn get_mut(&mut self, kind: ServerKind) -> &mut ServerSettings {
        match kind {
            ServerKind::Metrics => &mut self.metrics,
            ServerKind::Logs => &mut self.logs,
            ServerKind::Traces => &mut self.traces,
        }
    }

    /// Iterate kinds in merge/validation order
    pub fn iter(&self) -> impl Iterator<Item = (ServerKind, &ServerSettings)> {
        ServerKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Fallback values for server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalServerDefaults {
    /// Default endpoint (default: `http://127.0.0.1:9090`)
    pub endpoint: String,
    /// Default API path (default: empty)
    pub api_path: String,
    /// Default insecure flag (default: `true`)
    pub insecure: bool,
    /// Default transport mode (default: `http`)
    pub mode: String,
}

impl Default for GlobalServerDefaults {
    fn default() -> Self {
        Self {
            endpoint: default_server_endpoint(),
            api_path: String::new(),
            insecure: true,
            mode: TransportMode::Http.as_str().to_string(),
        }
    }
}

/// Fallback values for client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalClientDefaults {
    /// Default client endpoint (default: `https://127.0.0.1:8080`)
    pub endpoint: String,
    /// Default export interval (default: 1s)
    pub interval: Duration,
    /// Default auth reference (default: empty)
    pub auth: String,
    /// Default insecure flag (default: `true`)
    pub insecure: bool,
    /// Labels offered to every client
    pub labels: HashMap<String, String>,
}

impl Default for GlobalClientDefaults {
    fn default() -> Self {
        Self {
            endpoint: default_client_endpoint(),
            interval: default_client_interval(),
            auth: String::new(),
            insecure: true,
            labels: HashMap::new(),
        }
    }
}

/// Global defaults applied to anything the document leaves unspecified
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalDefaults {
    /// Server defaults
    pub server: GlobalServerDefaults,
    /// Client defaults
    pub client: GlobalClientDefaults,
}

/// A destination receiving its own set of providers
///
/// # Example
///
/// ```
/// use otel_fanout::ClientSettings;
/// use std::time::Duration;
///
/// let client = ClientSettings::new("http://localhost:4317")
///     .with_auth("ops")
///     .with_interval(Duration::from_secs(10))
///     .with_label("region", "eu-west-1");
/// assert_eq!(client.labels["region"], "eu-west-1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    /// Client endpoint, also the key of the generated provider maps
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Name of the [`AuthRecord`] used by this client
    #[serde(default)]
    pub auth: Option<String>,

    /// Metrics export interval, written as `1s`, `500ms`, `1m30s`...
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,

    /// Insecure flag
    #[serde(default)]
    pub insecure: Option<bool>,

    /// Resource attributes attached to this client's providers
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl ClientSettings {
    /// Client with the given endpoint and nothing else set
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    /// Set the auth reference
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Set the export interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the insecure flag
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = Some(insecure);
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Named credentials referenced by clients
///
/// All three fields are required to be non-empty; that is checked during
/// validation, not while decoding. Names are expected to be unique but that
/// is not enforced.
#[derive(Debug, Deserialize)]
pub struct AuthRecord {
    /// Name clients refer to
    #[serde(default)]
    pub name: String,

    /// Username
    #[serde(default)]
    pub username: String,

    /// Password, redacted in `Debug` output
    #[serde(default = "empty_secret")]
    pub password: SecretString,
}

impl AuthRecord {
    /// Create a record
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Expose the password
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Root of a loaded telemetry configuration
///
/// # Lifecycle
///
/// 1. [`Configuration::new`] seeds the global defaults and enables the metrics
///    and logs kinds.
/// 2. [`Configuration::load_file`] (or [`Configuration::load_str`]) overlays the
///    document, merges the global defaults into it and validates the result.
/// 3. The configuration is then read-only; providers are generated with
///    [`Configuration::meter_providers`] and [`Configuration::logger_providers`].
///
/// `is_loaded()` and `is_success()` are independent: a document that decodes
/// but fails validation is loaded, so callers can inspect [`Configuration::report`].
///
/// # Example
///
/// ```no_run
/// use otel_fanout::Configuration;
///
/// # fn main() -> Result<(), otel_fanout::ConfigError> {
/// let mut config = Configuration::new();
/// config.load_file("telemetry.yaml")?;
/// if !config.is_success() {
///     for defect in config.report().defects() {
///         eprintln!("{defect}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Configuration {
    pub(crate) global: GlobalDefaults,
    pub(crate) servers: ServerKinds,
    pub(crate) clients: Vec<ClientSettings>,
    pub(crate) auths: Vec<AuthRecord>,
    pub(crate) collectors: HashMap<String, serde_yaml::Value>,

    pub(crate) loaded: bool,
    pub(crate) success: bool,
    pub(crate) report: ValidationReport,
    pub(crate) span: tracing::Span,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    /// Configuration seeded with the hardcoded defaults
    pub fn new() -> Self {
        Self {
            global: GlobalDefaults::default(),
            servers: ServerKinds::default(),
            clients: Vec::new(),
            auths: Vec::new(),
            collectors: HashMap::new(),
            loaded: false,
            success: true,
            report: ValidationReport::default(),
            span: tracing::Span::none(),
        }
    }

    /// Record every diagnostic of this configuration inside `span`
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Global defaults
    pub fn global(&self) -> &GlobalDefaults {
        &self.global
    }

    /// Per-kind server settings
    pub fn servers(&self) -> &ServerKinds {
        &self.servers
    }

    /// Clients in document order
    pub fn clients(&self) -> &[ClientSettings] {
        &self.clients
    }

    /// Auth records in document order
    pub fn auths(&self) -> &[AuthRecord] {
        &self.auths
    }

    /// Auth record named `name`, first match wins
    pub fn auth(&self, name: &str) -> Option<&AuthRecord> {
        self.auths.iter().find(|auth| auth.name == name)
    }

    /// Collector section, passed through unvalidated
    pub fn collectors(&self) -> &HashMap<String, serde_yaml::Value> {
        &self.collectors
    }

    /// Whether a document has been decoded, merged and validated
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether loading and validation both succeeded so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Findings of the last validation pass
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Merge defaults, validate and mark the configuration loaded
    pub(crate) fn finish_loading(&mut self) {
        self.apply_global();
        self.check_defects();
        self.loaded = true;
    }
}

/// Builder for creating configurations programmatically
///
/// `build()` runs the same merge and validation as a file load.
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    /// Create a new builder seeded with the hardcoded defaults
    pub fn new() -> Self {
        Self {
            config: Configuration::new(),
        }
    }

    /// Replace the global server defaults
    pub fn global_server(mut self, server: GlobalServerDefaults) -> Self {
        self.config.global.server = server;
        self
    }

    /// Replace the global client defaults
    pub fn global_client(mut self, client: GlobalClientDefaults) -> Self {
        self.config.global.client = client;
        self
    }

    /// Set the settings of one server kind
    pub fn server(mut self, kind: ServerKind, settings: ServerSettings) -> Self {
        *self.config.servers.get_mut(kind) = settings;
        self
    }

    /// Append a client
    pub fn client(mut self, client: ClientSettings) -> Self {
        self.config.clients.push(client);
        self
    }

    /// Append an auth record
    pub fn auth(mut self, auth: AuthRecord) -> Self {
        self.config.auths.push(auth);
        self
    }

    /// Add an opaque collector entry
    pub fn collector(mut self, name: impl Into<String>, value: serde_yaml::Value) -> Self {
        self.config.collectors.insert(name.into(), value);
        self
    }

    /// Record diagnostics inside `span`
    pub fn span(mut self, span: tracing::Span) -> Self {
        self.config.span = span;
        self
    }

    /// Merge, validate and return the loaded configuration
    pub fn build(mut self) -> Configuration {
        let span = self.config.span.clone();
        let _enter = span.enter();
        self.config.finish_loading();
        self.config
    }
}

// Default value functions
fn default_server_endpoint() -> String {
    "http://127.0.0.1:9090".to_string()
}

fn default_client_endpoint() -> String {
    "https://127.0.0.1:8080".to_string()
}

fn default_client_interval() -> Duration {
    Duration::from_secs(1)
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}
