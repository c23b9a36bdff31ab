//! Command proxy handler that routes HTTP requests to backend commands
//!
//! A single /api/invoke endpoint routes to the command functions in
//! `crate::commands`. Routing is organized into focused sub-modules in the
//! `routes/` directory:
//! - consultation_routes: Intake, chat, summary and export commands
//! - admin_routes: Stored-session listing commands
//! - config_routes: Configuration and service status commands

use super::routes;
use super::ServerAppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for /api/invoke endpoint
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    /// Command name (e.g., "start_consultation", "send_message")
    pub cmd: String,
    /// Command arguments as JSON object
    #[serde(default)]
    pub args: Value,
}

/// Response body for /api/invoke endpoint
#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    /// Whether the command succeeded
    pub success: bool,
    /// Result data (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error message (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error type for invoke handler
pub struct InvokeError {
    status: StatusCode,
    message: String,
}

impl InvokeError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for InvokeError {
    fn into_response(self) -> Response {
        let body = InvokeResponse {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Main Handler
// =============================================================================

/// Main invoke handler - routes commands to their implementations
pub async fn invoke_handler(
    State(state): State<ServerAppState>,
    Json(req): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, InvokeError> {
    log::debug!("Invoke command: {}", req.cmd);

    let result = routes::route_command(&req.cmd, req.args, &state).await;

    match result {
        Ok(data) => Ok(Json(InvokeResponse {
            success: true,
            data: Some(data),
            error: None,
        })),
        Err(e) => {
            log::warn!("Command {} failed: {}", req.cmd, e);
            Err(InvokeError::new(StatusCode::BAD_REQUEST, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_request_deserialization() {
        let json = r#"{"cmd": "send_message", "args": {"consultationId": "c-1", "message": "Hi"}}"#;
        let req: InvokeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.cmd, "send_message");
        assert_eq!(req.args["consultationId"], "c-1");

        let bare: InvokeRequest = serde_json::from_str(r#"{"cmd": "list_tools"}"#).unwrap();
        assert!(bare.args.is_null());
    }

    #[test]
    fn test_invoke_response_serialization() {
        let resp = InvokeResponse {
            success: true,
            data: Some(serde_json::json!({"totalRecords": 5})),
            error: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("totalRecords"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_invoke_error_status() {
        let response = InvokeError::new(StatusCode::BAD_REQUEST, "Missing argument: tool")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
