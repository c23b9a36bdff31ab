//! Attachment download routes
//!
//! Browsers fetch export files directly instead of decoding them from the
//! command proxy. Errors use the same `{success:false,error}` body as
//! `/api/invoke`.

use axum::{
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
};

use super::proxy::InvokeError;
use super::ServerAppState;
use crate::admin;
use crate::consultation::{ConsultationError, ConsultationView};
use crate::export::{self, ExportError, ExportFile};
use crate::persistence::StoreError;

/// Wrap an export file as an attachment response
fn attachment(file: ExportFile) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        file.file_name.replace('"', "")
    );
    (
        [
            (CONTENT_TYPE, file.content_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

fn consultation_error(e: ConsultationError) -> InvokeError {
    let status = match e {
        ConsultationError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    InvokeError::new(status, e.to_string())
}

fn export_error(e: ExportError) -> InvokeError {
    let status = match e {
        ExportError::NoAssistantTurn => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    InvokeError::new(status, e.to_string())
}

fn store_error(e: StoreError) -> InvokeError {
    let status = match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    InvokeError::new(status, e.to_string())
}

fn open_view(state: &ServerAppState, id: &str) -> Result<ConsultationView, InvokeError> {
    state.manager.get(id).map_err(consultation_error)
}

/// GET /api/consultations/:id/export.json
pub async fn consultation_json_handler(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Response, InvokeError> {
    let view = open_view(&state, &id)?;
    let file = export::export_json(&view, chrono::Utc::now()).map_err(export_error)?;
    log::info!("Consultation {} exported as {}", id, file.file_name);
    Ok(attachment(file))
}

/// GET /api/consultations/:id/export.pdf
pub async fn consultation_pdf_handler(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Response, InvokeError> {
    let view = open_view(&state, &id)?;
    let settings = state.config_state.get().report;
    let file = export::export_pdf(&view, &settings, state.pdf_renderer.as_ref())
        .await
        .map_err(export_error)?;
    log::info!("Consultation {} exported as {}", id, file.file_name);
    Ok(attachment(file))
}

/// GET /api/admin/sessions/:id/export.json
pub async fn admin_session_handler(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Response, InvokeError> {
    let store = state
        .require_store()
        .map_err(|e| InvokeError::new(StatusCode::SERVICE_UNAVAILABLE, e))?;
    let file = admin::export_session(store.as_ref(), &id)
        .await
        .map_err(store_error)?;
    Ok(attachment(file))
}
