//! Consultation command routing
//!
//! Handles the chat tool commands: list_tools, start_consultation,
//! submit_intake, send_message, select_option, get_consultation,
//! get_consultation_summary, close_consultation, save_consultation,
//! export_consultation_json, export_consultation_pdf

use crate::commands;
use crate::models::StakeholderInfo;
use serde_json::Value;

use super::{get_arg, route_async, route_sync, route_unit, ServerAppState};

/// Route consultation commands
pub async fn route_consultation_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, String> {
    match cmd {
        "list_tools" => route_sync!(Ok::<_, String>(commands::consultation::list_tools())),

        "start_consultation" => {
            let tool: String = get_arg(&args, "tool")?;
            route_sync!(commands::consultation::start_consultation(
                &state.manager,
                tool
            ))
        }

        "submit_intake" => {
            let id: String = get_arg(&args, "consultationId")?;
            let info: StakeholderInfo = get_arg(&args, "info")?;
            route_async!(
                cmd,
                commands::consultation::submit_intake(&state.manager, id, info)
            )
        }

        "send_message" => {
            let id: String = get_arg(&args, "consultationId")?;
            let message: String = get_arg(&args, "message")?;
            route_async!(
                cmd,
                commands::consultation::send_message(&state.manager, id, message)
            )
        }

        "select_option" => {
            let id: String = get_arg(&args, "consultationId")?;
            let option: String = get_arg(&args, "option")?;
            route_async!(
                cmd,
                commands::consultation::select_option(&state.manager, id, option)
            )
        }

        "get_consultation" => {
            let id: String = get_arg(&args, "consultationId")?;
            route_sync!(commands::consultation::get_consultation(&state.manager, id))
        }

        "get_consultation_summary" => {
            let id: String = get_arg(&args, "consultationId")?;
            route_sync!(commands::consultation::get_summary(&state.manager, id))
        }

        "close_consultation" => {
            let id: String = get_arg(&args, "consultationId")?;
            route_unit!(commands::consultation::close_consultation(
                &state.manager,
                id
            ))
        }

        "save_consultation" => {
            let id: String = get_arg(&args, "consultationId")?;
            let store = state.require_store()?;
            route_async!(
                cmd,
                commands::consultation::save_consultation(&state.manager, store.as_ref(), id)
            )
        }

        "export_consultation_json" => {
            let id: String = get_arg(&args, "consultationId")?;
            route_async!(
                cmd,
                commands::consultation::export_consultation_json(&state.manager, id)
            )
        }

        "export_consultation_pdf" => {
            let id: String = get_arg(&args, "consultationId")?;
            let settings = state.config_state.get().report;
            route_async!(
                cmd,
                commands::consultation::export_consultation_pdf(
                    &state.manager,
                    &settings,
                    state.pdf_renderer.as_ref(),
                    id
                )
            )
        }

        _ => Err(format!("Unknown consultation command: {}", cmd)),
    }
}

/// Check if a command is a consultation command
pub fn is_consultation_command(cmd: &str) -> bool {
    matches!(
        cmd,
        "list_tools"
            | "start_consultation"
            | "submit_intake"
            | "send_message"
            | "select_option"
            | "get_consultation"
            | "get_consultation_summary"
            | "close_consultation"
            | "save_consultation"
            | "export_consultation_json"
            | "export_consultation_pdf"
    )
}
