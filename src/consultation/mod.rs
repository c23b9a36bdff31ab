//! Conversation orchestration
//!
//! A consultation moves one way from `intake` to `conversing`. While
//! conversing, each user message is a single-flight turn guarded by a busy
//! flag: the user turn is appended, the persona agent is asked for a reply,
//! and the reply (or a fixed apology) is appended before the flag clears.

pub mod events;
mod manager;
mod save;

pub use events::{BroadcastEmitter, ConsultationEmitter, ConsultationEvent, NullEmitter};
pub use manager::ConsultationManager;
pub use save::{save_consultation, SaveError, SaveReport};

use crate::extraction::{self, ExtractionContext, ExtractionOutcome};
use crate::gateway::{AgentReply, AgentRequest};
use crate::models::{
    ConsultationPhase, ConsultationTool, ConversationTurn, EmbeddedQuestion, StakeholderInfo,
    SummaryBoard,
};
use crate::parsers::parse_reply;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsultationError {
    #[error("Consultation not found: {0}")]
    NotFound(String),

    #[error("Please fill in all required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error("Intake has already been submitted")]
    AlreadyStarted,

    #[error("Intake has not been submitted yet")]
    NotStarted,

    #[error("A reply is still pending")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("'{0}' is not one of the offered options")]
    InvalidOption(String),

    #[error("Consultation was closed before the reply arrived")]
    Closed,
}

/// Read-only summary panel of a consultation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub tool: ConsultationTool,
    pub total_records: usize,
    pub records: SummaryBoard,
}

/// Snapshot of a consultation for the browser
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationView {
    pub id: String,
    pub tool: ConsultationTool,
    pub persona: &'static str,
    pub phase: ConsultationPhase,
    pub stakeholder: StakeholderInfo,
    pub turns: Vec<ConversationTurn>,
    pub summary: SummaryView,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_question: Option<EmbeddedQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted_session_id: Option<String>,
    pub created_at: String,
}

/// Turns appended by one user submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub user_turn: ConversationTurn,
    pub assistant_turn: ConversationTurn,
    pub extraction: ExtractionOutcome,
}

/// In-memory state of one consultation
#[derive(Debug, Clone)]
pub struct Consultation {
    id: String,
    tool: ConsultationTool,
    phase: ConsultationPhase,
    stakeholder: StakeholderInfo,
    turns: Vec<ConversationTurn>,
    summary: SummaryBoard,
    agent_session_id: Option<String>,
    stage: Option<String>,
    busy: bool,
    persisted_session_id: Option<String>,
    created_at: String,
}

impl Consultation {
    pub fn new(tool: ConsultationTool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tool,
            phase: ConsultationPhase::Intake,
            stakeholder: StakeholderInfo::default(),
            turns: Vec::new(),
            summary: SummaryBoard::default(),
            agent_session_id: None,
            stage: None,
            busy: false,
            persisted_session_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tool(&self) -> ConsultationTool {
        self.tool
    }

    pub fn phase(&self) -> ConsultationPhase {
        self.phase
    }

    pub fn stakeholder(&self) -> &StakeholderInfo {
        &self.stakeholder
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn summary(&self) -> &SummaryBoard {
        &self.summary
    }

    pub fn agent_session_id(&self) -> Option<&str> {
        self.agent_session_id.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn persisted_session_id(&self) -> Option<&str> {
        self.persisted_session_id.as_deref()
    }

    pub fn set_persisted_session_id(&mut self, id: String) {
        self.persisted_session_id = Some(id);
    }

    /// Most recent assistant turn, if any
    pub fn latest_assistant_turn(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.is_assistant())
    }

    /// Question offered by the last turn, while it is still the last turn
    pub fn active_question(&self) -> Option<&EmbeddedQuestion> {
        self.turns
            .last()
            .filter(|t| t.is_assistant())
            .and_then(|t| t.question.as_ref())
    }

    pub fn summary_view(&self) -> SummaryView {
        SummaryView {
            tool: self.tool,
            total_records: self.summary.len(),
            records: self.summary.clone(),
        }
    }

    pub fn view(&self) -> ConsultationView {
        ConsultationView {
            id: self.id.clone(),
            tool: self.tool,
            persona: self.tool.persona(),
            phase: self.phase,
            stakeholder: self.stakeholder.clone(),
            turns: self.turns.clone(),
            summary: self.summary_view(),
            busy: self.busy,
            agent_session_id: self.agent_session_id.clone(),
            stage: self.stage.clone(),
            active_question: self.active_question().cloned(),
            persisted_session_id: self.persisted_session_id.clone(),
            created_at: self.created_at.clone(),
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Accept the intake form and move to `conversing`.
    ///
    /// A missing required field leaves the phase and stored details untouched.
    pub fn submit_intake(&mut self, info: StakeholderInfo) -> Result<(), ConsultationError> {
        if self.phase != ConsultationPhase::Intake {
            return Err(ConsultationError::AlreadyStarted);
        }

        let missing = info.missing_fields();
        if !missing.is_empty() {
            return Err(ConsultationError::Validation { missing });
        }

        self.stakeholder = StakeholderInfo {
            name: info.name.trim().to_string(),
            role: info.role.trim().to_string(),
            department: info.department.trim().to_string(),
            email: info
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        };
        self.phase = ConsultationPhase::Conversing;
        Ok(())
    }

    /// Request for the opening message, or `None` when the persona greets locally.
    ///
    /// Marks the consultation busy when a request is returned.
    pub fn begin_opening(&mut self) -> Option<AgentRequest> {
        let message = self.tool.opening_message(&self.stakeholder)?;
        self.busy = true;
        Some(AgentRequest::new(
            self.tool,
            message,
            &self.stakeholder,
            &self.turns,
            self.agent_session_id.clone(),
        ))
    }

    /// Append the opening reply, or the persona greeting when there is none
    pub fn finish_opening(&mut self, reply: Option<AgentReply>) -> ConversationTurn {
        let turn = match reply {
            Some(reply) => {
                self.record_agent_state(&reply);
                self.assistant_turn_from(reply)
            }
            None => ConversationTurn::assistant(self.tool.greeting(&self.stakeholder)),
        };
        self.busy = false;
        self.turns.push(turn.clone());
        turn
    }

    /// Append a user turn and build the agent request for it.
    ///
    /// Rejected while a reply is pending.
    pub fn begin_turn(
        &mut self,
        text: &str,
        interactive: bool,
    ) -> Result<(ConversationTurn, AgentRequest), ConsultationError> {
        if self.phase != ConsultationPhase::Conversing {
            return Err(ConsultationError::NotStarted);
        }
        if self.busy {
            return Err(ConsultationError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ConsultationError::EmptyMessage);
        }

        let mut turn = ConversationTurn::user(text);
        turn.insights = extraction::extract_insights(text);
        turn.interactive_response = interactive;

        self.busy = true;
        self.turns.push(turn.clone());

        // History includes the turn being sent
        let request = AgentRequest::new(
            self.tool,
            text,
            &self.stakeholder,
            &self.turns,
            self.agent_session_id.clone(),
        );
        Ok((turn, request))
    }

    /// Label of an offered option, validated against the active question
    pub fn resolve_option(&self, option: &str) -> Result<String, ConsultationError> {
        let question = self
            .active_question()
            .ok_or_else(|| ConsultationError::InvalidOption(option.to_string()))?;
        question
            .options
            .iter()
            .find(|o| o.as_str() == option)
            .cloned()
            .ok_or_else(|| ConsultationError::InvalidOption(option.to_string()))
    }

    /// Append the agent reply and run the extraction pass over the exchange
    pub fn complete_turn(
        &mut self,
        user_text: &str,
        reply: AgentReply,
    ) -> (ConversationTurn, ExtractionOutcome) {
        self.record_agent_state(&reply);
        let raw_reply = reply.message.clone();
        let turn = self.assistant_turn_from(reply);

        let ctx = ExtractionContext {
            department: &self.stakeholder.department,
            lead: &self.stakeholder.name,
        };
        let outcome = extraction::extract(self.tool, &ctx, user_text, &raw_reply, &mut self.summary);

        self.busy = false;
        self.turns.push(turn.clone());
        (turn, outcome)
    }

    /// Append the fixed apology turn after a failed request
    pub fn fail_turn(&mut self) -> ConversationTurn {
        let turn = ConversationTurn::assistant(self.tool.apology());
        self.busy = false;
        self.turns.push(turn.clone());
        turn
    }

    fn record_agent_state(&mut self, reply: &AgentReply) {
        if let Some(session_id) = reply.session_id.as_ref().filter(|s| !s.is_empty()) {
            self.agent_session_id = Some(session_id.clone());
        }
        if let Some(stage) = reply.conversation_stage() {
            self.stage = Some(stage.to_string());
        }
    }

    fn assistant_turn_from(&self, reply: AgentReply) -> ConversationTurn {
        let parsed = parse_reply(&reply.message, reply.interactive_question_data);
        let mut turn = ConversationTurn::assistant(parsed.clean_message);
        turn.html = parsed.html;
        turn.question = parsed.question;
        turn.data = reply.data;
        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sender;

    fn info() -> StakeholderInfo {
        StakeholderInfo {
            name: "Sam Lee".to_string(),
            role: "Head Teacher".to_string(),
            department: "Nursing".to_string(),
            email: None,
        }
    }

    fn reply(message: &str) -> AgentReply {
        AgentReply {
            message: message.to_string(),
            data: None,
            session_id: None,
            interactive_question_data: None,
        }
    }

    fn conversing(tool: ConsultationTool) -> Consultation {
        let mut consultation = Consultation::new(tool);
        consultation.submit_intake(info()).unwrap();
        consultation
    }

    #[test]
    fn test_intake_missing_role_stays_in_intake() {
        let mut consultation = Consultation::new(ConsultationTool::Capacity);
        let mut incomplete = info();
        incomplete.role = String::new();

        let err = consultation.submit_intake(incomplete).unwrap_err();
        assert_eq!(err, ConsultationError::Validation { missing: vec!["role"] });
        assert_eq!(consultation.phase(), ConsultationPhase::Intake);
        assert_eq!(consultation.stakeholder(), &StakeholderInfo::default());
    }

    #[test]
    fn test_intake_is_one_way() {
        let mut consultation = conversing(ConsultationTool::Risk);
        assert_eq!(consultation.phase(), ConsultationPhase::Conversing);
        assert_eq!(
            consultation.submit_intake(info()),
            Err(ConsultationError::AlreadyStarted)
        );
    }

    #[test]
    fn test_messages_rejected_before_intake() {
        let mut consultation = Consultation::new(ConsultationTool::Risk);
        assert_eq!(
            consultation.begin_turn("hello", false).unwrap_err(),
            ConsultationError::NotStarted
        );
    }

    #[test]
    fn test_local_greeting_when_no_opening() {
        let mut consultation = conversing(ConsultationTool::Delivery);
        assert!(consultation.begin_opening().is_none());
        let turn = consultation.finish_opening(None);
        assert!(turn.text.starts_with("G'day Sam Lee! I'm Riva"));
        assert_eq!(consultation.turns().len(), 1);
    }

    #[test]
    fn test_failed_opening_uses_fallback_greeting() {
        let mut consultation = conversing(ConsultationTool::Capacity);
        let request = consultation.begin_opening().unwrap();
        assert!(request.message.contains("capacity assessment"));
        assert!(consultation.is_busy());

        let turn = consultation.finish_opening(None);
        assert!(turn.text.starts_with("Hi Sam Lee! I'm Morgan"));
        assert!(!consultation.is_busy());
    }

    #[test]
    fn test_busy_rejects_second_submission() {
        let mut consultation = conversing(ConsultationTool::Capacity);
        consultation.begin_turn("first", false).unwrap();
        assert_eq!(
            consultation.begin_turn("second", false).unwrap_err(),
            ConsultationError::Busy
        );
        assert_eq!(consultation.turns().len(), 1);
    }

    #[test]
    fn test_gateway_failure_appends_one_apology() {
        let mut consultation = conversing(ConsultationTool::Capacity);
        consultation.begin_turn("we are understaffed", false).unwrap();
        consultation.fail_turn();

        let turns = consultation.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].sender, Sender::Assistant);
        assert_eq!(turns[1].text, ConsultationTool::Capacity.apology());
        assert!(!consultation.is_busy());
        // No extraction on failure
        assert!(consultation.summary().is_empty());
    }

    #[test]
    fn test_complete_turn_extracts_and_tracks_session() {
        let mut consultation = conversing(ConsultationTool::Capacity);
        let (_, request) = consultation.begin_turn("we are understaffed and overloaded", false).unwrap();
        assert!(request.session_id.is_none());

        let mut agent_reply = reply("That sounds hard. Tell me about training.");
        agent_reply.session_id = Some("agent-7".to_string());
        let (turn, outcome) = consultation.complete_turn("we are understaffed and overloaded", agent_reply);

        assert_eq!(turn.sender, Sender::Assistant);
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(consultation.summary().capacity_gaps.len(), 1);
        assert_eq!(consultation.agent_session_id(), Some("agent-7"));

        let (_, next) = consultation.begin_turn("ok", false).unwrap();
        assert_eq!(next.session_id.as_deref(), Some("agent-7"));
        assert_eq!(next.context.conversation_history.len(), 3);
    }

    #[test]
    fn test_request_history_ends_with_submitted_text() {
        let mut consultation = conversing(ConsultationTool::Risk);
        consultation.finish_opening(Some(reply("Welcome")));

        let (_, request) = consultation.begin_turn("staff turnover is high", false).unwrap();
        let history = &request.context.conversation_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "Welcome");
        assert_eq!(history[1].sender, "user");
        assert_eq!(history[1].message, "staff turnover is high");
    }

    #[test]
    fn test_transcript_is_ordered() {
        let mut consultation = conversing(ConsultationTool::Risk);
        consultation.finish_opening(Some(reply("Welcome")));
        consultation.begin_turn("one", false).unwrap();
        consultation.complete_turn("one", reply("two"));
        let texts: Vec<&str> = consultation.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Welcome", "one", "two"]);
    }

    #[test]
    fn test_active_question_only_while_last() {
        let mut consultation = conversing(ConsultationTool::Priority);
        consultation.begin_turn("hi", false).unwrap();
        consultation.complete_turn(
            "hi",
            reply(r#"<form><h3>Pick one?</h3><input type="radio" id="a" value="A"><label for="a">Alpha</label></form>"#),
        );
        assert_eq!(consultation.resolve_option("Alpha").unwrap(), "Alpha");
        assert!(consultation.resolve_option("Beta").is_err());

        let (turn, _) = consultation.begin_turn("Alpha", true).unwrap();
        assert!(turn.interactive_response);
        assert!(consultation.active_question().is_none());
    }
}
