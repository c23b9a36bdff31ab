//! Configuration command routing
//!
//! Handles configuration and settings commands: get_config, reload_config,
//! get_config_paths_cmd, update_report_config, set_store_key, get_service_status

use crate::commands;
use serde_json::Value;

use super::{get_arg, get_opt_arg, route_async, route_sync, route_unit_async, ServerAppState};

/// Route configuration commands
pub async fn route_config_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, String> {
    match cmd {
        "get_config" | "reload_config" => {
            route_async!(cmd, commands::config::get_config(&state.config_state))
        }

        "get_config_paths_cmd" => route_async!(cmd, commands::config::get_config_paths_cmd()),

        "update_report_config" => {
            let organisation: Option<String> = get_opt_arg(&args, "organisation")?;
            let accent_color: Option<String> = get_opt_arg(&args, "accentColor")?;
            route_async!(
                cmd,
                commands::config::update_report_config(
                    organisation,
                    accent_color,
                    &state.config_state
                )
            )
        }

        "set_store_key" => {
            let key: String = get_arg(&args, "key")?;
            route_unit_async!(commands::config::set_store_key(key))
        }

        "get_service_status" => {
            let config = state.config_state.get();
            route_sync!(Ok::<_, String>(commands::config::service_status(
                &config,
                state.store.is_some()
            )))
        }

        _ => Err(format!("Unknown config command: {}", cmd)),
    }
}

/// Check if a command is a config command
pub fn is_config_command(cmd: &str) -> bool {
    matches!(
        cmd,
        "get_config"
            | "reload_config"
            | "get_config_paths_cmd"
            | "update_report_config"
            | "set_store_key"
            | "get_service_status"
    )
}
