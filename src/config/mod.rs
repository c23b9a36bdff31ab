// Layered configuration system

pub mod merger;
pub mod secrets;

pub use merger::{
    ConfigMerger, PartialConfig, PartialGatewaySettings, PartialReportSettings,
    PartialServerSettings, PartialStoreSettings,
};
pub use secrets::SecretsConfig;

use crate::models::ConsultationTool;
use crate::utils::app_dir;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const ENV_BACKEND_URL: &str = "CONSULT_BACKEND_URL";
pub const ENV_STORE_URL: &str = "CONSULT_STORE_URL";
pub const ENV_STORE_KEY: &str = "CONSULT_STORE_KEY";

/// Full runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConsultConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub report: ReportSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3420
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Remote agent backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Per-tool path overrides keyed by tool name (e.g. `risk = "/risk-agent"`)
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8004".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            paths: BTreeMap::new(),
        }
    }
}

impl GatewaySettings {
    /// Path overrides with recognised tool names; unknown keys are logged and skipped
    pub fn tool_paths(&self) -> Vec<(ConsultationTool, String)> {
        self.paths
            .iter()
            .filter_map(|(key, path)| match key.parse::<ConsultationTool>() {
                Ok(tool) => Some((tool, path.clone())),
                Err(e) => {
                    log::warn!("Ignoring gateway path override: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Hosted relational store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl StoreSettings {
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
            && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Report branding and PDF converter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_organisation")]
    pub organisation: String,
    #[serde(default = "default_accent")]
    pub accent_color: String,
    #[serde(default = "default_pdf_command")]
    pub pdf_command: String,
    #[serde(default = "default_pdf_args")]
    pub pdf_args: Vec<String>,
}

fn default_organisation() -> String {
    "TAFE NSW".to_string()
}
fn default_accent() -> String {
    "#16a34a".to_string()
}
fn default_pdf_command() -> String {
    "wkhtmltopdf".to_string()
}
fn default_pdf_args() -> Vec<String> {
    [
        "--quiet",
        "--encoding",
        "utf-8",
        "--page-size",
        "A4",
        "--margin-top",
        "10mm",
        "--margin-bottom",
        "10mm",
        "-",
        "-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            organisation: default_organisation(),
            accent_color: default_accent(),
            pdf_command: default_pdf_command(),
            pdf_args: default_pdf_args(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Global config path (~/.consult-desk/config.toml)
pub fn global_config_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join("config.toml"))
}

/// Read a partial config file; a missing file yields `None`
pub fn load_partial(path: &Path) -> Result<Option<PartialConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
    let partial: PartialConfig = toml::from_str(&contents)
        .map_err(|e| anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;

    log::debug!("Loaded config layer from {}", path.display());
    Ok(Some(partial))
}

/// Load and merge configuration from all sources.
///
/// Priority: CLI -> environment -> explicit file -> global file -> defaults.
/// The store key falls back to the secrets file when no layer sets it.
pub fn load_config(explicit: Option<&Path>, cli: Option<PartialConfig>) -> Result<ConsultConfig> {
    let global = match global_config_path() {
        Some(path) => load_partial(&path)?,
        None => None,
    };

    let file = match explicit {
        Some(path) if !path.exists() => {
            return Err(anyhow!("Config file '{}' does not exist", path.display()))
        }
        Some(path) => load_partial(path)?,
        None => None,
    };

    let mut config = ConfigMerger::new()
        .with_global(global)
        .with_file(file)
        .with_env(Some(PartialConfig::from_env()))
        .with_cli(cli)
        .merge();

    if config.store.api_key.is_none() {
        match SecretsConfig::load() {
            Ok(secrets) => config.store.api_key = secrets.store_key,
            Err(e) => log::warn!("Failed to load secrets: {}", e),
        }
    }

    Ok(config)
}

/// Shared configuration for the running server
pub struct ConfigState {
    config: RwLock<ConsultConfig>,
}

impl ConfigState {
    pub fn new(config: ConsultConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub fn get(&self) -> ConsultConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply a partial update and return the result
    pub fn update(&self, partial: &PartialConfig) -> ConsultConfig {
        let mut guard = match self.config.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = ConfigMerger::apply(&guard, partial);
        guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ConsultConfig::default();
        assert_eq!(config.server.port, 3420);
        assert_eq!(config.report.organisation, "TAFE NSW");
        assert_eq!(config.report.pdf_command, "wkhtmltopdf");
        assert!(!config.store.is_configured());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9000

[gateway.paths]
risk = "/v2/risk"
"#,
        )
        .unwrap();

        let partial = load_partial(&path).unwrap().unwrap();
        let config = ConfigMerger::new().with_file(Some(partial)).merge();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.gateway.paths["risk"], "/v2/risk");
    }

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_partial(&temp_dir.path().join("absent.toml")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[server\nport = ").unwrap();
        assert!(load_partial(&path).is_err());
    }

    #[test]
    fn test_tool_paths_skip_unknown() {
        let mut gateway = GatewaySettings::default();
        gateway.paths.insert("risk".to_string(), "/r".to_string());
        gateway.paths.insert("nonsense".to_string(), "/n".to_string());
        assert_eq!(gateway.tool_paths(), vec![(ConsultationTool::Risk, "/r".to_string())]);
    }

    #[test]
    fn test_config_state_update() {
        let state = ConfigState::new(ConsultConfig::default());
        let partial = PartialConfig {
            report: Some(PartialReportSettings {
                organisation: Some("Acme".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let updated = state.update(&partial);
        assert_eq!(updated.report.organisation, "Acme");
        assert_eq!(state.get().report.pdf_command, "wkhtmltopdf");
    }
}
