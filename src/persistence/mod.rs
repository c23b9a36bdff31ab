//! Persistence gateway
//!
//! Stores stakeholders, consultation sessions, transcript messages and
//! priorities in a hosted relational store, and reads them back for the admin
//! listing.

mod postgrest;

pub use postgrest::PostgrestStore;

use crate::models::{Insight, SessionDetail, SessionListing, StoredStakeholder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STAKEHOLDERS_TABLE: &str = "stakeholders";
pub const SESSIONS_TABLE: &str = "consultation_sessions";
pub const MESSAGES_TABLE: &str = "conversation_messages";
pub const PRIORITIES_TABLE: &str = "priorities";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid store response: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store is not configured: {0}")]
    NotConfigured(String),
}

// ============================================================================
// Insert Rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStakeholder {
    pub name: String,
    pub role: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub stakeholder_id: String,
    pub consultation_type: String,
    pub session_data: serde_json::Value,
    pub completion_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub session_id: String,
    pub sender: String,
    pub message_text: String,
    pub timestamp: String,
    pub ai_insights: Vec<Insight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPriority {
    pub session_id: String,
    pub title: String,
    pub description: String,
    pub importance_score: u8,
    pub urgency_score: u8,
    pub theme: String,
}

/// Hosted store holding consultation records
#[async_trait]
pub trait ConsultationStore: Send + Sync {
    async fn insert_stakeholder(&self, row: &NewStakeholder)
        -> Result<StoredStakeholder, StoreError>;

    async fn insert_session(&self, row: &NewSession) -> Result<SessionListing, StoreError>;

    async fn insert_messages(&self, rows: &[NewMessage]) -> Result<(), StoreError>;

    async fn insert_priorities(&self, rows: &[NewPriority]) -> Result<(), StoreError>;

    /// One session joined with its stakeholder, messages and priorities
    async fn get_session(&self, id: &str) -> Result<SessionDetail, StoreError>;

    /// All sessions with a stakeholder summary, newest first
    async fn list_sessions(&self) -> Result<Vec<SessionListing>, StoreError>;
}
