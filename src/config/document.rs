//! YAML overlay document
//!
//! The file is decoded into a document where every scalar is optional and
//! then overlaid onto an existing [`Configuration`], so values the file omits
//! (such as the server kinds' `enabled` flags) keep whatever was seeded.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::types::{AuthRecord, ClientSettings, Configuration, ServerSettings};
use crate::error::ConfigError;

/// Top-level document: `global`, `server`, `clients`, `auths`, `collectors`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigDocument {
    global: Option<GlobalDocument>,
    server: Option<ServerKindsDocument>,
    clients: Option<Vec<ClientSettings>>,
    auths: Option<Vec<AuthRecord>>,
    collectors: Option<HashMap<String, serde_yaml::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalDocument {
    server: Option<ServerDefaultsDocument>,
    client: Option<ClientDefaultsDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerDefaultsDocument {
    endpoint: Option<String>,
    api_path: Option<String>,
    insecure: Option<bool>,
    mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ClientDefaultsDocument {
    endpoint: Option<String>,
    #[serde(default, with = "humantime_serde")]
    interval: Option<Duration>,
    auth: Option<String>,
    insecure: Option<bool>,
    labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerKindsDocument {
    metrics: Option<ServerDocument>,
    logs: Option<ServerDocument>,
    traces: Option<ServerDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerDocument {
    enabled: Option<bool>,
    endpoint: Option<String>,
    api_path: Option<String>,
    insecure: Option<bool>,
    mode: Option<String>,
}

impl ConfigDocument {
    /// Decode a YAML document; an empty or comment-only input is an empty overlay
    pub(crate) fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_value(value)?)
    }

    /// Overlay every present field onto `config`
    pub(crate) fn apply(self, config: &mut Configuration) {
        if let Some(global) = self.global {
            if let Some(server) = global.server {
                let defaults = &mut config.global.server;
                overlay(&mut defaults.endpoint, server.endpoint);
                overlay(&mut defaults.api_path, server.api_path);
                overlay(&mut defaults.insecure, server.insecure);
                overlay(&mut defaults.mode, server.mode);
            }
            if let Some(client) = global.client {
                let defaults = &mut config.global.client;
                overlay(&mut defaults.endpoint, client.endpoint);
                overlay(&mut defaults.interval, client.interval);
                overlay(&mut defaults.auth, client.auth);
                overlay(&mut defaults.insecure, client.insecure);
                if let Some(labels) = client.labels {
                    defaults.labels.extend(labels);
                }
            }
        }

        if let Some(server) = self.server {
            overlay_server(&mut config.servers.metrics, server.metrics);
            overlay_server(&mut config.servers.logs, server.logs);
            overlay_server(&mut config.servers.traces, server.traces);
        }

        if let Some(clients) = self.clients {
            config.clients = clients;
        }
        if let Some(auths) = self.auths {
            config.auths = auths;
        }
        if let Some(collectors) = self.collectors {
            config.collectors.extend(collectors);
        }
    }
}

fn overlay<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn overlay_server(target: &mut ServerSettings, document: Option<ServerDocument>) {
    let Some(document) = document else {
        return;
    };
    overlay(&mut target.enabled, document.enabled);
    if document.endpoint.is_some() {
        target.endpoint = document.endpoint;
    }
    if document.api_path.is_some() {
        target.api_path = document.api_path;
    }
    if document.insecure.is_some() {
        target.insecure = document.insecure;
    }
    if document.mode.is_some() {
        target.mode = document.mode;
    }
}
