//! Admin command routing
//!
//! Handles the stored-session listing: list_admin_sessions, export_admin_session

use crate::commands;
use serde_json::Value;

use super::{get_arg, get_opt_arg, route_async, ServerAppState};

/// Route admin commands
pub async fn route_admin_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, String> {
    let store = state.require_store()?;

    match cmd {
        "list_admin_sessions" => {
            let filter: Option<String> = get_opt_arg(&args, "consultationType")?;
            route_async!(
                cmd,
                commands::admin::list_admin_sessions(store.as_ref(), filter)
            )
        }

        "export_admin_session" => {
            let id: String = get_arg(&args, "sessionId")?;
            route_async!(
                cmd,
                commands::admin::export_admin_session(store.as_ref(), id)
            )
        }

        _ => Err(format!("Unknown admin command: {}", cmd)),
    }
}

/// Check if a command is an admin command
pub fn is_admin_command(cmd: &str) -> bool {
    matches!(cmd, "list_admin_sessions" | "export_admin_session")
}
