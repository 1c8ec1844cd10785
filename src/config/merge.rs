//! Default merging
//!
//! Fills every field a document left unspecified from the global defaults.
//! Merging is a pure function of `(overlay, defaults)`; [`Configuration`]
//! applies it once per server kind and once per client.

use tracing::debug;

use crate::config::types::{
    ClientSettings, Configuration, GlobalClientDefaults, GlobalServerDefaults, ServerKind,
    ServerSettings,
};

/// Merge global server defaults into `overlay`
///
/// `enabled` is never defaulted; each optional field is taken from
/// `defaults` only when `overlay` leaves it unset.
pub fn merge_server(overlay: &ServerSettings, defaults: &GlobalServerDefaults) -> ServerSettings {
    ServerSettings {
        enabled: overlay.enabled,
        endpoint: Some(
            overlay
                .endpoint
                .clone()
                .unwrap_or_else(|| defaults.endpoint.clone()),
        ),
        api_path: Some(
            overlay
                .api_path
                .clone()
                .unwrap_or_else(|| defaults.api_path.clone()),
        ),
        insecure: Some(overlay.insecure.unwrap_or(defaults.insecure)),
        mode: Some(overlay.mode.clone().unwrap_or_else(|| defaults.mode.clone())),
    }
}

/// Merge global client defaults into `overlay`
///
/// Only `auth`, `interval` and `labels` are defaulted; `endpoint` and
/// `insecure` stay as the document wrote them.
///
/// A global label is copied only when its key is not found by the collision
/// check, and that check looks the key up in the global label map itself.
/// Every key is found there, so no global label reaches the client.
pub fn merge_client(overlay: &ClientSettings, defaults: &GlobalClientDefaults) -> ClientSettings {
    let mut labels = overlay.labels.clone();
    for (key, value) in &defaults.labels {
        let found = defaults.labels.contains_key(key);
        if !found {
            labels.insert(key.clone(), value.clone());
        }
    }

    ClientSettings {
        endpoint: overlay.endpoint.clone(),
        auth: Some(overlay.auth.clone().unwrap_or_else(|| defaults.auth.clone())),
        interval: Some(overlay.interval.unwrap_or(defaults.interval)),
        insecure: overlay.insecure,
        labels,
    }
}

impl Configuration {
    /// Apply the global defaults to every server kind, then every client
    pub(crate) fn apply_global(&mut self) {
        for kind in ServerKind::ALL {
            let merged = merge_server(self.servers.get(kind), &self.global.server);
            *self.servers.get_mut(kind) = merged;
        }

        self.clients = self
            .clients
            .iter()
            .map(|client| merge_client(client, &self.global.client))
            .collect();

        debug!(
            clients = self.clients.len(),
            "Applied global defaults to servers and clients"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unset_server_fields_take_global_values() {
        let defaults = GlobalServerDefaults::default();
        let merged = merge_server(&ServerSettings::enabled(), &defaults);

        assert!(merged.enabled);
        assert_eq!(merged.endpoint.as_deref(), Some("http://127.0.0.1:9090"));
        assert_eq!(merged.api_path.as_deref(), Some(""));
        assert_eq!(merged.insecure, Some(true));
        assert_eq!(merged.mode.as_deref(), Some("http"));
    }

    #[test]
    fn test_explicit_server_fields_win() {
        let overlay = ServerSettings::disabled()
            .with_endpoint("http://collector:4318")
            .with_api_path("/v1/metrics")
            .with_insecure(false)
            .with_mode("grpc");
        let merged = merge_server(&overlay, &GlobalServerDefaults::default());

        assert_eq!(merged, overlay);
    }

    #[test]
    fn test_explicit_false_is_not_overwritten() {
        let overlay = ServerSettings::enabled().with_insecure(false);
        let merged = merge_server(&overlay, &GlobalServerDefaults::default());
        assert_eq!(merged.insecure, Some(false));

        let overlay = ServerSettings::enabled().with_api_path("");
        let defaults = GlobalServerDefaults {
            api_path: "/otlp".to_string(),
            ..GlobalServerDefaults::default()
        };
        let merged = merge_server(&overlay, &defaults);
        assert_eq!(merged.api_path.as_deref(), Some(""));
    }

    #[test]
    fn test_client_auth_and_interval_defaults() {
        let defaults = GlobalClientDefaults {
            auth: "shared".to_string(),
            interval: Duration::from_secs(15),
            ..GlobalClientDefaults::default()
        };
        let merged = merge_client(&ClientSettings::new("http://a:4317"), &defaults);

        assert_eq!(merged.auth.as_deref(), Some("shared"));
        assert_eq!(merged.interval, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_client_endpoint_and_insecure_are_not_defaulted() {
        let merged = merge_client(&ClientSettings::default(), &GlobalClientDefaults::default());

        assert_eq!(merged.endpoint, None);
        assert_eq!(merged.insecure, None);
    }

    #[test]
    fn test_global_labels_are_never_copied() {
        let mut defaults = GlobalClientDefaults::default();
        defaults.labels.insert("team".to_string(), "core".to_string());
        defaults.labels.insert("env".to_string(), "prod".to_string());

        let overlay = ClientSettings::new("http://a:4317").with_label("env", "staging");
        let merged = merge_client(&overlay, &defaults);

        assert_eq!(merged.labels.len(), 1);
        assert_eq!(merged.labels["env"], "staging");
        assert!(!merged.labels.contains_key("team"));
    }
}
