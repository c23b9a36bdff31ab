// Admin listing commands

use crate::admin::{self, AdminListing};
use crate::persistence::ConsultationStore;

use super::consultation::ExportPayload;

/// Stored sessions with dashboard counts, filtered by consultation type
pub async fn list_admin_sessions(
    store: &dyn ConsultationStore,
    filter: Option<String>,
) -> Result<AdminListing, String> {
    let filter = filter.unwrap_or_else(|| admin::ALL_TYPES.to_string());
    admin::list_sessions(store, &filter)
        .await
        .map_err(|e| format!("Failed to load sessions: {}", e))
}

/// Full stored session as a JSON download
pub async fn export_admin_session(
    store: &dyn ConsultationStore,
    id: String,
) -> Result<ExportPayload, String> {
    let file = admin::export_session(store, &id)
        .await
        .map_err(|e| format!("Failed to load session: {}", e))?;
    ExportPayload::from_file(file)
}
