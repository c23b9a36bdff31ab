//! Remote agent gateway
//!
//! Sends a stakeholder message plus conversation context to the persona agent
//! of a consultation tool and returns its reply.

mod http;

pub use http::HttpAgentGateway;

use crate::models::{ConsultationTool, ConversationTurn, EmbeddedQuestion, StakeholderInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors talking to the agent backend
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Agent backend unreachable: {source}")]
    Unreachable {
        #[from]
        source: reqwest::Error,
    },

    #[error("Agent backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid agent response: {0}")]
    Decode(String),

    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

/// One prior turn as the backend expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: String,
    pub message: String,
}

impl From<&ConversationTurn> for HistoryEntry {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            sender: turn.sender.wire_label().to_string(),
            message: turn.text.clone(),
        }
    }
}

/// Conversational context sent with every message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    pub user_id: String,
    pub name: String,
    pub role: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "conversationHistory")]
    pub conversation_history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub message: String,
    pub context: AgentContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AgentRequest {
    /// Build a request carrying the full transcript so far
    pub fn new(
        tool: ConsultationTool,
        message: impl Into<String>,
        info: &StakeholderInfo,
        history: &[ConversationTurn],
        session_id: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            context: AgentContext {
                user_id: tool.user_id(info),
                name: info.name.clone(),
                role: info.role.clone(),
                department: info.department.clone(),
                email: info.email.clone(),
                conversation_history: history.iter().map(HistoryEntry::from).collect(),
                session_id: session_id.clone(),
            },
            session_id,
        }
    }
}

/// Reply from a persona agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub interactive_question_data: Option<EmbeddedQuestion>,
}

impl AgentReply {
    /// Conversation stage reported in the structured data, if any
    pub fn conversation_stage(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("conversation_stage"))
            .and_then(|s| s.as_str())
    }
}

/// Transport to the persona agents
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Send one message to the agent serving `tool`
    async fn send(
        &self,
        tool: ConsultationTool,
        request: AgentRequest,
    ) -> Result<AgentReply, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let info = StakeholderInfo {
            name: "Sam Lee".to_string(),
            role: "Teacher".to_string(),
            department: "Nursing".to_string(),
            email: None,
        };
        let history = vec![
            ConversationTurn::assistant("Hello"),
            ConversationTurn::user("We need more staff"),
        ];
        let request = AgentRequest::new(
            ConsultationTool::Capacity,
            "We need more staff",
            &info,
            &history,
            Some("s-1".to_string()),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["session_id"], "s-1");
        assert_eq!(json["context"]["user_id"], "sam_lee");
        assert_eq!(json["context"]["conversationHistory"][0]["sender"], "ai");
        assert_eq!(json["context"]["conversationHistory"][1]["sender"], "user");
        assert!(json["context"].get("email").is_none());
    }

    #[test]
    fn test_reply_with_stage_and_question() {
        let reply: AgentReply = serde_json::from_value(serde_json::json!({
            "message": "<form>...</form>",
            "data": {"conversation_stage": "discovery", "progress": 20},
            "session_id": "abc",
            "interactive_question_data": {"question": "Pick", "options": ["A", "B"]}
        }))
        .unwrap();
        assert_eq!(reply.conversation_stage(), Some("discovery"));
        assert_eq!(reply.interactive_question_data.unwrap().options.len(), 2);
    }

    #[test]
    fn test_minimal_reply() {
        let reply: AgentReply = serde_json::from_str(r#"{"message": "Hi"}"#).unwrap();
        assert!(reply.session_id.is_none());
        assert!(reply.conversation_stage().is_none());
    }
}
