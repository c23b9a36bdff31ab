// Save flow - writes a consultation to the hosted store

use super::{ConsultationError, ConsultationManager};
use crate::models::ConsultationPhase;
use crate::persistence::{
    ConsultationStore, NewMessage, NewPriority, NewSession, NewStakeholder, StoreError,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

const COMPLETION_WITH_SUMMARY: u32 = 75;
const COMPLETION_WITHOUT_SUMMARY: u32 = 25;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Consultation(#[from] ConsultationError),

    #[error("Failed to save consultation: {0}")]
    Store(#[from] StoreError),
}

/// Result of a successful save
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub session_id: String,
    pub stakeholder_id: String,
    pub messages_saved: usize,
    pub priorities_saved: usize,
    pub completion_percentage: u32,
}

/// Persist stakeholder, session, transcript and priorities in that order.
///
/// Inserts that succeeded before a failure are left in place.
pub async fn save_consultation(
    manager: &ConsultationManager,
    store: &dyn ConsultationStore,
    id: &str,
) -> Result<SaveReport, SaveError> {
    let snapshot = manager.get(id)?;
    if snapshot.phase != ConsultationPhase::Conversing {
        return Err(ConsultationError::NotStarted.into());
    }
    let now = chrono::Utc::now().to_rfc3339();

    let stakeholder = store
        .insert_stakeholder(&NewStakeholder {
            name: snapshot.stakeholder.name.clone(),
            role: snapshot.stakeholder.role.clone(),
            department: snapshot.stakeholder.department.clone(),
            email: snapshot.stakeholder.email.clone(),
            created_at: now,
        })
        .await?;

    let completion_percentage = if snapshot.summary.total_records > 0 {
        COMPLETION_WITH_SUMMARY
    } else {
        COMPLETION_WITHOUT_SUMMARY
    };

    let session = store
        .insert_session(&NewSession {
            stakeholder_id: stakeholder.id.clone(),
            consultation_type: snapshot.tool.consultation_type().to_string(),
            session_data: json!({
                "summary": snapshot.summary.records,
                "conversation": snapshot.turns,
            }),
            completion_percentage,
        })
        .await?;

    let messages: Vec<NewMessage> = snapshot
        .turns
        .iter()
        .map(|turn| NewMessage {
            session_id: session.id.clone(),
            sender: turn.sender.wire_label().to_string(),
            message_text: turn.text.clone(),
            timestamp: turn.timestamp.clone(),
            ai_insights: turn.insights.clone(),
        })
        .collect();
    store.insert_messages(&messages).await?;

    let priorities: Vec<NewPriority> = snapshot
        .summary
        .records
        .priorities
        .iter()
        .map(|p| NewPriority {
            session_id: session.id.clone(),
            title: p.title.clone(),
            description: p.description.clone(),
            importance_score: p.importance,
            urgency_score: p.urgency,
            theme: p.themes.join(", "),
        })
        .collect();
    store.insert_priorities(&priorities).await?;

    manager.mark_persisted(id, session.id.clone())?;
    log::info!(
        "Saved consultation {} as session {} ({} messages, {} priorities)",
        id,
        session.id,
        messages.len(),
        priorities.len()
    );

    Ok(SaveReport {
        session_id: session.id,
        stakeholder_id: stakeholder.id,
        messages_saved: messages.len(),
        priorities_saved: priorities.len(),
        completion_percentage,
    })
}

