//! Consultation exports
//!
//! Two formats are produced from the same snapshot: a pretty-printed JSON
//! document of the whole session, and a PDF report of the latest assistant
//! assessment rendered from an HTML template by an external converter.

mod pdf;
mod report;

pub use pdf::{CommandPdfRenderer, PdfRenderer};
pub use report::render_report;

use crate::config::ReportSettings;
use crate::consultation::{ConsultationView, SummaryView};
use crate::models::{ConversationTurn, StakeholderInfo};
use crate::utils::{date_stamp, hyphenate};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No assessment data to export yet")]
    NoAssistantTurn,

    #[error("Failed to render report: {0}")]
    Render(String),

    #[error("PDF converter failed: {0}")]
    Converter(String),

    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished export ready to download
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

// ============================================================================
// JSON
// ============================================================================

/// Document written by the JSON export
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument<'a> {
    pub stakeholder: &'a StakeholderInfo,
    pub consultation_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
    pub conversation: &'a [ConversationTurn],
    pub summary: &'a SummaryView,
    pub export_date: String,
}

/// `<prefix>-<name>-<YYYY-MM-DD>.json`
pub fn json_file_name(view: &ConsultationView, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}.json",
        view.tool.export_prefix(),
        hyphenate(&view.stakeholder.name),
        date_stamp(at)
    )
}

pub fn export_json(view: &ConsultationView, at: DateTime<Utc>) -> Result<ExportFile, ExportError> {
    if !view.turns.iter().any(ConversationTurn::is_assistant) {
        return Err(ExportError::NoAssistantTurn);
    }

    let document = ExportDocument {
        stakeholder: &view.stakeholder,
        consultation_type: view.tool.consultation_type(),
        agent: view.tool.agent_label(),
        session_id: view.agent_session_id.as_deref(),
        conversation: &view.turns,
        summary: &view.summary,
        export_date: at.to_rfc3339(),
    };

    let bytes = serde_json::to_vec_pretty(&document)
        .map_err(|e| ExportError::Render(format!("JSON serialization failed: {}", e)))?;

    Ok(ExportFile {
        file_name: json_file_name(view, at),
        content_type: "application/json",
        bytes,
    })
}

// ============================================================================
// PDF
// ============================================================================

/// `<organisation>-<tool title>.pdf` with whitespace runs hyphenated
pub fn pdf_file_name(view: &ConsultationView, settings: &ReportSettings) -> String {
    format!(
        "{}.pdf",
        hyphenate(&format!("{} {}", settings.organisation, view.tool.title()))
    )
}

/// Render the latest assistant assessment and convert it to PDF
pub async fn export_pdf(
    view: &ConsultationView,
    settings: &ReportSettings,
    renderer: &dyn PdfRenderer,
) -> Result<ExportFile, ExportError> {
    let latest = view
        .turns
        .iter()
        .rev()
        .find(|t| t.is_assistant())
        .ok_or(ExportError::NoAssistantTurn)?;

    let html = render_report(view, latest, settings, chrono::Local::now())?;
    let bytes = renderer.render(&html).await?;
    log::info!(
        "Exported PDF report for consultation {} ({} bytes)",
        view.id,
        bytes.len()
    );

    Ok(ExportFile {
        file_name: pdf_file_name(view, settings),
        content_type: "application/pdf",
        bytes,
    })
}
