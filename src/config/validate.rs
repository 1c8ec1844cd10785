//! Configuration validation
//!
//! Validation inspects the merged tree and never stops at the first problem:
//! every finding is logged and collected in a [`ValidationReport`]. Whether a
//! finding fails the configuration is decided by [`Defect::severity`].

use std::fmt;

use tracing::error;
use url::Url;

use crate::config::types::{
    AuthRecord, ClientSettings, Configuration, ServerKind, ServerKinds, TransportMode,
};

/// How a defect affects the overall outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fails the configuration
    Fatal,
    /// Logged only
    Advisory,
}

/// A problem found while validating a merged configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// An enabled server kind has an endpoint that is not a URL
    ServerEndpoint {
        /// Server kind
        kind: ServerKind,
        /// Endpoint as written
        endpoint: String,
        /// Parser error
        reason: String,
    },

    /// An enabled server kind has a mode other than `http` or `grpc`
    ServerMode {
        /// Server kind
        kind: ServerKind,
        /// Mode as written
        mode: String,
    },

    /// Clients whose endpoint is missing or not a URL, counted together
    ClientEndpoints {
        /// Number of offending clients
        count: usize,
    },

    /// A client refers to an auth name no record carries
    UnknownAuth {
        /// Referenced name
        auth: String,
    },

    /// An auth record has an empty name
    AuthName,

    /// An auth record has an empty username or password
    AuthCredentials {
        /// Name of the record
        auth: String,
    },
}

impl Defect {
    /// Severity policy: an unknown auth reference is advisory, everything
    /// else fails the configuration.
    pub fn severity(&self) -> Severity {
        match self {
            Defect::UnknownAuth { .. } => Severity::Advisory,
            Defect::ServerEndpoint { .. }
            | Defect::ServerMode { .. }
            | Defect::ClientEndpoints { .. }
            | Defect::AuthName
            | Defect::AuthCredentials { .. } => Severity::Fatal,
        }
    }

    fn log(&self) {
        match self {
            Defect::ServerEndpoint {
                kind,
                endpoint,
                reason,
            } => error!(
                kind = %kind,
                endpoint = %endpoint,
                error = %reason,
                "failed to parse {kind} endpoint"
            ),
            Defect::ServerMode { kind, mode } => {
                error!(kind = %kind, mode = %mode, "unsupported {kind} transport mode")
            }
            Defect::ClientEndpoints { count } => {
                error!(error_count = count, "invalid the endpoint of client")
            }
            Defect::UnknownAuth { auth } => error!(auth = %auth, "auth not found"),
            Defect::AuthName => error!("auth name is not set"),
            Defect::AuthCredentials { auth } => {
                error!(auth = %auth, "auth username or password is not set")
            }
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::ServerEndpoint {
                kind,
                endpoint,
                reason,
            } => write!(f, "{kind} endpoint {endpoint:?} is not a valid URL: {reason}"),
            Defect::ServerMode { kind, mode } => {
                write!(f, "{kind} mode {mode:?} is not \"http\" or \"grpc\"")
            }
            Defect::ClientEndpoints { count } => {
                write!(f, "{count} client(s) have a missing or invalid endpoint")
            }
            Defect::UnknownAuth { auth } => write!(f, "auth {auth:?} not found"),
            Defect::AuthName => f.write_str("auth name is not set"),
            Defect::AuthCredentials { auth } => {
                write!(f, "auth {auth:?} username or password is not set")
            }
        }
    }
}

/// Every defect found by one validation pass, in check order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    defects: Vec<Defect>,
}

impl ValidationReport {
    /// All defects
    pub fn defects(&self) -> &[Defect] {
        &self.defects
    }

    /// Defects that fail the configuration
    pub fn fatal(&self) -> impl Iterator<Item = &Defect> {
        self.defects
            .iter()
            .filter(|defect| defect.severity() == Severity::Fatal)
    }

    /// Defects that are only logged
    pub fn advisories(&self) -> impl Iterator<Item = &Defect> {
        self.defects
            .iter()
            .filter(|defect| defect.severity() == Severity::Advisory)
    }

    /// True when no fatal defect was found
    pub fn is_success(&self) -> bool {
        self.fatal().next().is_none()
    }

    fn record(&mut self, defect: Defect) {
        defect.log();
        self.defects.push(defect);
    }
}

/// Validate a merged configuration tree
pub fn validate(
    servers: &ServerKinds,
    clients: &[ClientSettings],
    auths: &[AuthRecord],
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (kind, settings) in servers.iter().filter(|(_, s)| s.enabled) {
        let endpoint = settings.endpoint.as_deref().unwrap_or_default();
        if let Err(e) = Url::parse(endpoint) {
            report.record(Defect::ServerEndpoint {
                kind,
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            });
        }

        let mode = settings.mode.as_deref().unwrap_or_default();
        if mode.parse::<TransportMode>().is_err() {
            report.record(Defect::ServerMode {
                kind,
                mode: mode.to_string(),
            });
        }
    }

    let mut endpoint_errors = 0;
    for client in clients {
        let valid = client
            .endpoint
            .as_deref()
            .is_some_and(|endpoint| Url::parse(endpoint).is_ok());
        if !valid {
            endpoint_errors += 1;
        }

        let auth = client.auth.as_deref().unwrap_or_default();
        if !auths.iter().any(|record| record.name == auth) {
            report.record(Defect::UnknownAuth {
                auth: auth.to_string(),
            });
        }
    }
    if endpoint_errors > 0 {
        report.record(Defect::ClientEndpoints {
            count: endpoint_errors,
        });
    }

    for record in auths {
        if record.name.is_empty() {
            report.record(Defect::AuthName);
        }
        if record.username.is_empty() || record.password().is_empty() {
            report.record(Defect::AuthCredentials {
                auth: record.name.clone(),
            });
        }
    }

    report
}

impl Configuration {
    /// Validate the merged tree, clearing the success flag on fatal defects
    pub(crate) fn check_defects(&mut self) {
        let report = validate(&self.servers, &self.clients, &self.auths);
        if !report.is_success() {
            self.success = false;
        }
        self.report = report;
    }
}
