// Configuration merging with priority

use super::{
    ConsultConfig, GatewaySettings, ReportSettings, ServerSettings, StoreSettings,
    ENV_BACKEND_URL, ENV_STORE_KEY, ENV_STORE_URL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partial configuration for merging
/// Uses Option<T> for all fields to support partial overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub server: Option<PartialServerSettings>,
    #[serde(default)]
    pub gateway: Option<PartialGatewaySettings>,
    #[serde(default)]
    pub store: Option<PartialStoreSettings>,
    #[serde(default)]
    pub report: Option<PartialReportSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PartialServerSettings {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PartialGatewaySettings {
    pub base_url: Option<String>,
    /// Merged key by key into the lower layer's paths
    pub paths: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PartialStoreSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PartialReportSettings {
    pub organisation: Option<String>,
    pub accent_color: Option<String>,
    pub pdf_command: Option<String>,
    pub pdf_args: Option<Vec<String>>,
}

impl PartialConfig {
    /// Overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overrides from an arbitrary variable lookup; blank values are ignored
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gateway = get(ENV_BACKEND_URL).map(|base_url| PartialGatewaySettings {
            base_url: Some(base_url),
            paths: None,
        });

        let url = get(ENV_STORE_URL);
        let api_key = get(ENV_STORE_KEY);
        let store = if url.is_some() || api_key.is_some() {
            Some(PartialStoreSettings { url, api_key })
        } else {
            None
        };

        Self {
            server: None,
            gateway,
            store,
            report: None,
        }
    }
}

/// Configuration merger
/// Priority order: CLI -> Environment -> Explicit file -> Global -> Defaults
pub struct ConfigMerger {
    defaults: ConsultConfig,
    layers: Vec<PartialConfig>,
}

impl ConfigMerger {
    /// Create a new config merger with defaults
    pub fn new() -> Self {
        Self {
            defaults: ConsultConfig::default(),
            layers: Vec::new(),
        }
    }

    fn with_layer(mut self, layer: Option<PartialConfig>) -> Self {
        if let Some(layer) = layer {
            self.layers.push(layer);
        }
        self
    }

    /// Set global config (~/.consult-desk/config.toml)
    pub fn with_global(self, config: Option<PartialConfig>) -> Self {
        self.with_layer(config)
    }

    /// Set the file passed with --config
    pub fn with_file(self, config: Option<PartialConfig>) -> Self {
        self.with_layer(config)
    }

    /// Set environment overrides
    pub fn with_env(self, config: Option<PartialConfig>) -> Self {
        self.with_layer(config)
    }

    /// Set CLI overrides
    pub fn with_cli(self, config: Option<PartialConfig>) -> Self {
        self.with_layer(config)
    }

    /// Merge all layers in the order they were added
    pub fn merge(&self) -> ConsultConfig {
        self.layers
            .iter()
            .fold(self.defaults.clone(), |acc, layer| Self::apply(&acc, layer))
    }

    /// Merge a partial config into a full config
    pub fn apply(base: &ConsultConfig, partial: &PartialConfig) -> ConsultConfig {
        ConsultConfig {
            server: partial
                .server
                .as_ref()
                .map(|p| Self::merge_server(&base.server, p))
                .unwrap_or_else(|| base.server.clone()),
            gateway: partial
                .gateway
                .as_ref()
                .map(|p| Self::merge_gateway(&base.gateway, p))
                .unwrap_or_else(|| base.gateway.clone()),
            store: partial
                .store
                .as_ref()
                .map(|p| Self::merge_store(&base.store, p))
                .unwrap_or_else(|| base.store.clone()),
            report: partial
                .report
                .as_ref()
                .map(|p| Self::merge_report(&base.report, p))
                .unwrap_or_else(|| base.report.clone()),
        }
    }

    fn merge_server(base: &ServerSettings, p: &PartialServerSettings) -> ServerSettings {
        ServerSettings {
            bind: p.bind.clone().unwrap_or_else(|| base.bind.clone()),
            port: p.port.unwrap_or(base.port),
            cors_origins: p
                .cors_origins
                .clone()
                .unwrap_or_else(|| base.cors_origins.clone()),
        }
    }

    fn merge_gateway(base: &GatewaySettings, p: &PartialGatewaySettings) -> GatewaySettings {
        let mut paths = base.paths.clone();
        if let Some(overrides) = &p.paths {
            paths.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        GatewaySettings {
            base_url: p.base_url.clone().unwrap_or_else(|| base.base_url.clone()),
            paths,
        }
    }

    fn merge_store(base: &StoreSettings, p: &PartialStoreSettings) -> StoreSettings {
        StoreSettings {
            url: p.url.clone().or_else(|| base.url.clone()),
            api_key: p.api_key.clone().or_else(|| base.api_key.clone()),
        }
    }

    fn merge_report(base: &ReportSettings, p: &PartialReportSettings) -> ReportSettings {
        ReportSettings {
            organisation: p
                .organisation
                .clone()
                .unwrap_or_else(|| base.organisation.clone()),
            accent_color: p
                .accent_color
                .clone()
                .unwrap_or_else(|| base.accent_color.clone()),
            pdf_command: p
                .pdf_command
                .clone()
                .unwrap_or_else(|| base.pdf_command.clone()),
            pdf_args: p.pdf_args.clone().unwrap_or_else(|| base.pdf_args.clone()),
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn server(port: u16) -> PartialConfig {
        PartialConfig {
            server: Some(PartialServerSettings {
                port: Some(port),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_defaults_only() {
        assert_eq!(ConfigMerger::new().merge(), ConsultConfig::default());
    }

    #[test]
    fn test_later_layers_win() {
        let config = ConfigMerger::new()
            .with_global(Some(server(4000)))
            .with_file(Some(server(5000)))
            .with_cli(Some(server(6000)))
            .merge();
        assert_eq!(config.server.port, 6000);
    }

    #[test]
    fn test_unset_fields_fall_through() {
        let global = PartialConfig {
            server: Some(PartialServerSettings {
                bind: Some("0.0.0.0".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = ConfigMerger::new()
            .with_global(Some(global))
            .with_cli(Some(server(7000)))
            .merge();
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_gateway_paths_merge_by_key() {
        let layer = |key: &str, path: &str| PartialConfig {
            gateway: Some(PartialGatewaySettings {
                base_url: None,
                paths: Some(BTreeMap::from([(key.to_string(), path.to_string())])),
            }),
            ..Default::default()
        };
        let config = ConfigMerger::new()
            .with_global(Some(layer("risk", "/a")))
            .with_file(Some(layer("capacity", "/b")))
            .merge();
        assert_eq!(config.gateway.paths.len(), 2);
        assert_eq!(config.gateway.base_url, "http://127.0.0.1:8004");
    }

    #[test]
    fn test_env_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_BACKEND_URL, "https://agents.example.org"),
            (ENV_STORE_URL, "https://db.example.org"),
            (ENV_STORE_KEY, "  "),
        ]);
        let partial = PartialConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        let config = ConfigMerger::new().with_env(Some(partial)).merge();
        assert_eq!(config.gateway.base_url, "https://agents.example.org");
        assert_eq!(config.store.url.as_deref(), Some("https://db.example.org"));
        assert!(config.store.api_key.is_none());
    }

    #[test]
    fn test_partial_from_toml() {
        let partial: PartialConfig = toml::from_str(
            r#"
[report]
organisation = "Acme Institute"
"#,
        )
        .unwrap();
        let config = ConfigMerger::new().with_file(Some(partial)).merge();
        assert_eq!(config.report.organisation, "Acme Institute");
        assert_eq!(config.report.pdf_command, "wkhtmltopdf");
    }
}
