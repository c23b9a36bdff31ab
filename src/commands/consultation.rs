// Consultation commands
// Consultations live in memory until saved to the hosted store

use crate::config::ReportSettings;
use crate::consultation::{
    self, ConsultationManager, ConsultationView, SaveReport, SummaryView, TurnResult,
};
use crate::export::{self, ExportFile, PdfRenderer};
use crate::models::{ConsultationTool, StakeholderInfo};
use crate::persistence::ConsultationStore;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

/// Tool card shown on the landing page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub tool: ConsultationTool,
    pub title: &'static str,
    pub persona: &'static str,
    pub consultation_type: &'static str,
}

/// Export file returned through the command proxy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub file_name: String,
    pub content_type: &'static str,
    /// `utf8` for JSON documents, `base64` for PDF bytes
    pub encoding: &'static str,
    pub data: String,
}

impl ExportPayload {
    pub fn from_file(file: ExportFile) -> Result<Self, String> {
        if file.content_type == "application/json" {
            let data = String::from_utf8(file.bytes)
                .map_err(|e| format!("Export is not valid UTF-8: {}", e))?;
            Ok(Self {
                file_name: file.file_name,
                content_type: file.content_type,
                encoding: "utf8",
                data,
            })
        } else {
            Ok(Self {
                file_name: file.file_name,
                content_type: file.content_type,
                encoding: "base64",
                data: BASE64.encode(&file.bytes),
            })
        }
    }
}

/// List the available consultation tools
pub fn list_tools() -> Vec<ToolInfo> {
    ConsultationTool::ALL
        .iter()
        .map(|&tool| ToolInfo {
            tool,
            title: tool.title(),
            persona: tool.persona(),
            consultation_type: tool.consultation_type(),
        })
        .collect()
}

/// Open a new consultation for a tool
pub fn start_consultation(
    manager: &ConsultationManager,
    tool: String,
) -> Result<ConsultationView, String> {
    let tool: ConsultationTool = tool.parse()?;
    Ok(manager.create(tool))
}

/// Submit the intake form and fetch the opening message
pub async fn submit_intake(
    manager: &ConsultationManager,
    id: String,
    info: StakeholderInfo,
) -> Result<ConsultationView, String> {
    manager
        .submit_intake(&id, info)
        .await
        .map_err(|e| e.to_string())
}

/// Send one user message
pub async fn send_message(
    manager: &ConsultationManager,
    id: String,
    message: String,
) -> Result<TurnResult, String> {
    manager
        .send_message(&id, &message)
        .await
        .map_err(|e| e.to_string())
}

/// Answer the active embedded question
pub async fn select_option(
    manager: &ConsultationManager,
    id: String,
    option: String,
) -> Result<TurnResult, String> {
    manager
        .select_option(&id, &option)
        .await
        .map_err(|e| e.to_string())
}

pub fn get_consultation(
    manager: &ConsultationManager,
    id: String,
) -> Result<ConsultationView, String> {
    manager.get(&id).map_err(|e| e.to_string())
}

pub fn get_summary(manager: &ConsultationManager, id: String) -> Result<SummaryView, String> {
    manager.summary(&id).map_err(|e| e.to_string())
}

/// Close a consultation; called when the browser leaves the page
pub fn close_consultation(manager: &ConsultationManager, id: String) -> Result<(), String> {
    manager.close(&id).map_err(|e| e.to_string())
}

/// Persist a consultation to the hosted store
pub async fn save_consultation(
    manager: &ConsultationManager,
    store: &dyn ConsultationStore,
    id: String,
) -> Result<SaveReport, String> {
    consultation::save_consultation(manager, store, &id)
        .await
        .map_err(|e| e.to_string())
}

/// Build the JSON export file of a consultation
pub fn export_json_file(manager: &ConsultationManager, id: &str) -> Result<ExportFile, String> {
    let view = manager.get(id).map_err(|e| e.to_string())?;
    export::export_json(&view, chrono::Utc::now()).map_err(|e| e.to_string())
}

/// Build the PDF report of a consultation
pub async fn export_pdf_file(
    manager: &ConsultationManager,
    settings: &ReportSettings,
    renderer: &dyn PdfRenderer,
    id: &str,
) -> Result<ExportFile, String> {
    let view = manager.get(id).map_err(|e| e.to_string())?;
    export::export_pdf(&view, settings, renderer)
        .await
        .map_err(|e| e.to_string())
}

pub async fn export_consultation_json(
    manager: &ConsultationManager,
    id: String,
) -> Result<ExportPayload, String> {
    ExportPayload::from_file(export_json_file(manager, &id)?)
}

pub async fn export_consultation_pdf(
    manager: &ConsultationManager,
    settings: &ReportSettings,
    renderer: &dyn PdfRenderer,
    id: String,
) -> Result<ExportPayload, String> {
    ExportPayload::from_file(export_pdf_file(manager, settings, renderer, &id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_tools() {
        let tools = list_tools();
        assert_eq!(tools.len(), 6);
        assert!(tools
            .iter()
            .any(|t| t.persona == "Josh" && t.consultation_type == "external_stakeholder"));
    }

    #[test]
    fn test_payload_encoding() {
        let json = ExportPayload::from_file(ExportFile {
            file_name: "a.json".to_string(),
            content_type: "application/json",
            bytes: b"{}".to_vec(),
        })
        .unwrap();
        assert_eq!(json.encoding, "utf8");
        assert_eq!(json.data, "{}");

        let pdf = ExportPayload::from_file(ExportFile {
            file_name: "a.pdf".to_string(),
            content_type: "application/pdf",
            bytes: b"%PDF".to_vec(),
        })
        .unwrap();
        assert_eq!(pdf.encoding, "base64");
        assert_eq!(pdf.data, "JVBERg==");
    }
}
