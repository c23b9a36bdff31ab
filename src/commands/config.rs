// Configuration commands

use crate::config::{
    global_config_path, ConfigState, ConsultConfig, PartialConfig, PartialReportSettings,
    SecretsConfig,
};
use crate::utils::ResultExt;
use serde::Serialize;

/// Where configuration is read from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPaths {
    pub global_path: Option<String>,
    pub global_exists: bool,
    pub secrets_path: Option<String>,
    pub secrets_exists: bool,
}

/// Converter and store readiness shown on the settings page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub pdf_command: String,
    pub pdf_available: bool,
    pub store_configured: bool,
    pub backend_url: String,
}

/// Get current configuration
pub async fn get_config(config_state: &ConfigState) -> Result<ConsultConfig, String> {
    Ok(config_state.get())
}

/// Get configuration file paths
pub async fn get_config_paths_cmd() -> Result<ConfigPaths, String> {
    let global = global_config_path();
    let secrets = SecretsConfig::get_secrets_path();

    Ok(ConfigPaths {
        global_exists: global.as_ref().map(|p| p.exists()).unwrap_or(false),
        secrets_exists: secrets.as_ref().map(|p| p.exists()).unwrap_or(false),
        global_path: global.map(|p| p.to_string_lossy().to_string()),
        secrets_path: secrets.map(|p| p.to_string_lossy().to_string()),
    })
}

/// Update report branding for subsequent PDF exports
pub async fn update_report_config(
    organisation: Option<String>,
    accent_color: Option<String>,
    config_state: &ConfigState,
) -> Result<ConsultConfig, String> {
    if organisation.as_deref().is_some_and(|o| o.trim().is_empty()) {
        return Err("Organisation cannot be empty".to_string());
    }

    let partial = PartialConfig {
        report: Some(PartialReportSettings {
            organisation,
            accent_color,
            ..Default::default()
        }),
        ..Default::default()
    };
    Ok(config_state.update(&partial))
}

/// Store the hosted store API key in the secrets file.
///
/// Takes effect on the next server start.
pub async fn set_store_key(key: String) -> Result<(), String> {
    let mut secrets = SecretsConfig::load().with_context("Failed to load secrets")?;
    secrets.store_key = Some(key);
    secrets.save().with_context("Failed to save secrets")
}

pub fn service_status(config: &ConsultConfig, store_configured: bool) -> ServiceStatus {
    ServiceStatus {
        pdf_command: config.report.pdf_command.clone(),
        pdf_available: which::which(&config.report.pdf_command).is_ok(),
        store_configured,
        backend_url: config.gateway.base_url.clone(),
    }
}
