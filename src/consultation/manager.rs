// Consultation manager - owns every open consultation and drives agent calls

use super::events::{ConsultationEmitter, ConsultationEvent};
use super::{Consultation, ConsultationError, ConsultationView, SummaryView, TurnResult};
use crate::gateway::{AgentGateway, AgentReply, AgentRequest, GatewayError};
use crate::models::{ConsultationTool, ConversationTurn, StakeholderInfo};
use crate::utils::lock_mutex_recover;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory registry of consultations.
///
/// The map lock is only held for state transitions, never across a gateway
/// call, so slow replies for one consultation never block another.
pub struct ConsultationManager {
    consultations: Mutex<HashMap<String, Consultation>>,
    gateway: Arc<dyn AgentGateway>,
    emitter: Arc<dyn ConsultationEmitter>,
}

impl ConsultationManager {
    pub fn new(gateway: Arc<dyn AgentGateway>, emitter: Arc<dyn ConsultationEmitter>) -> Self {
        Self {
            consultations: Mutex::new(HashMap::new()),
            gateway,
            emitter,
        }
    }

    /// Open a consultation in the intake phase
    pub fn create(&self, tool: ConsultationTool) -> ConsultationView {
        let consultation = Consultation::new(tool);
        let view = consultation.view();
        log::info!("Consultation {} started ({})", view.id, tool);
        lock_mutex_recover(&self.consultations).insert(view.id.clone(), consultation);
        view
    }

    pub fn get(&self, id: &str) -> Result<ConsultationView, ConsultationError> {
        self.with_consultation(id, Consultation::view)
    }

    pub fn summary(&self, id: &str) -> Result<SummaryView, ConsultationError> {
        self.with_consultation(id, Consultation::summary_view)
    }

    /// Run `f` against a consultation under the map lock
    pub fn with_consultation<R>(
        &self,
        id: &str,
        f: impl FnOnce(&Consultation) -> R,
    ) -> Result<R, ConsultationError> {
        let consultations = lock_mutex_recover(&self.consultations);
        consultations
            .get(id)
            .map(f)
            .ok_or_else(|| ConsultationError::NotFound(id.to_string()))
    }

    fn with_consultation_mut<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Consultation) -> R,
    ) -> Result<R, ConsultationError> {
        let mut consultations = lock_mutex_recover(&self.consultations);
        consultations
            .get_mut(id)
            .map(f)
            .ok_or_else(|| ConsultationError::NotFound(id.to_string()))
    }

    pub fn open_count(&self) -> usize {
        lock_mutex_recover(&self.consultations).len()
    }

    pub fn ids(&self) -> Vec<String> {
        lock_mutex_recover(&self.consultations).keys().cloned().collect()
    }

    // ========================================================================
    // Conversation
    // ========================================================================

    /// Accept the intake form, then fetch the persona's opening message
    pub async fn submit_intake(
        &self,
        id: &str,
        info: StakeholderInfo,
    ) -> Result<ConsultationView, ConsultationError> {
        let (tool, request) = self.with_consultation_mut(id, |c| {
            c.submit_intake(info)?;
            Ok::<_, ConsultationError>((c.tool(), c.begin_opening()))
        })??;

        let reply = match request {
            Some(request) => {
                self.emit_busy(id, true);
                self.call_gateway(id, tool, request).await.ok()
            }
            None => None,
        };

        let (turn, view) = self
            .with_consultation_mut(id, |c| {
                let turn = c.finish_opening(reply);
                (turn, c.view())
            })
            .map_err(|_| self.dropped(id))?;

        self.emit_turn(id, turn);
        self.emit_busy(id, false);
        Ok(view)
    }

    /// Submit one user message and wait for the assistant turn.
    ///
    /// A gateway failure still succeeds: the assistant turn is the persona's
    /// apology.
    pub async fn send_message(&self, id: &str, text: &str) -> Result<TurnResult, ConsultationError> {
        self.submit(id, text, false).await
    }

    /// Answer the active embedded question with one of its options
    pub async fn select_option(
        &self,
        id: &str,
        option: &str,
    ) -> Result<TurnResult, ConsultationError> {
        let label = self.with_consultation(id, |c| c.resolve_option(option))??;
        self.submit(id, &label, true).await
    }

    async fn submit(
        &self,
        id: &str,
        text: &str,
        interactive: bool,
    ) -> Result<TurnResult, ConsultationError> {
        let (tool, user_turn, request) = self.with_consultation_mut(id, |c| {
            c.begin_turn(text, interactive)
                .map(|(turn, request)| (c.tool(), turn, request))
        })??;

        self.emit_turn(id, user_turn.clone());
        self.emit_busy(id, true);

        let user_text = user_turn.text.clone();
        let result = self.call_gateway(id, tool, request).await;

        let applied = self.with_consultation_mut(id, |c| match result {
            Ok(reply) => {
                let (turn, outcome) = c.complete_turn(&user_text, reply);
                (turn, outcome, c.summary_view())
            }
            Err(_) => (c.fail_turn(), Default::default(), c.summary_view()),
        });
        let (assistant_turn, extraction, summary) = applied.map_err(|_| self.dropped(id))?;

        self.emit_turn(id, assistant_turn.clone());
        if !extraction.is_empty() {
            self.emitter.emit(ConsultationEvent::Summary {
                consultation_id: id.to_string(),
                added: extraction.added.clone(),
                summary,
            });
        }
        self.emit_busy(id, false);

        Ok(TurnResult {
            user_turn,
            assistant_turn,
            extraction,
        })
    }

    async fn call_gateway(
        &self,
        id: &str,
        tool: ConsultationTool,
        request: AgentRequest,
    ) -> Result<AgentReply, GatewayError> {
        self.gateway.send(tool, request).await.map_err(|e| {
            log::warn!("Agent request for consultation {} failed: {}", id, e);
            e
        })
    }

    fn dropped(&self, id: &str) -> ConsultationError {
        log::warn!("Consultation {} closed while awaiting a reply; response dropped", id);
        ConsultationError::Closed
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Record the store id after a successful save
    pub fn mark_persisted(&self, id: &str, session_id: String) -> Result<(), ConsultationError> {
        self.with_consultation_mut(id, |c| c.set_persisted_session_id(session_id))
    }

    /// Destroy a consultation and tell its subscribers
    pub fn close(&self, id: &str) -> Result<(), ConsultationError> {
        let removed = lock_mutex_recover(&self.consultations).remove(id);
        if removed.is_none() {
            return Err(ConsultationError::NotFound(id.to_string()));
        }
        log::info!("Consultation {} closed", id);
        self.emitter.emit(ConsultationEvent::Closed {
            consultation_id: id.to_string(),
        });
        Ok(())
    }

    /// Close every open consultation, returning how many were closed
    pub fn close_all(&self) -> usize {
        self.ids()
            .iter()
            .filter(|id| self.close(id).is_ok())
            .count()
    }

    fn emit_turn(&self, id: &str, turn: ConversationTurn) {
        self.emitter.emit(ConsultationEvent::Turn {
            consultation_id: id.to_string(),
            turn,
        });
    }

    fn emit_busy(&self, id: &str, busy: bool) {
        self.emitter.emit(ConsultationEvent::Busy {
            consultation_id: id.to_string(),
            busy,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consultation::NullEmitter;
    use crate::models::ConsultationPhase;
    use async_trait::async_trait;

    struct EchoGateway;

    #[async_trait]
    impl AgentGateway for EchoGateway {
        async fn send(
            &self,
            _tool: ConsultationTool,
            request: AgentRequest,
        ) -> Result<AgentReply, GatewayError> {
            Ok(AgentReply {
                message: format!("You said: {}", request.message),
                data: None,
                session_id: Some("agent-1".to_string()),
                interactive_question_data: None,
            })
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl AgentGateway for FailingGateway {
        async fn send(
            &self,
            _tool: ConsultationTool,
            _request: AgentRequest,
        ) -> Result<AgentReply, GatewayError> {
            Err(GatewayError::Status {
                status: 503,
                message: "down".to_string(),
            })
        }
    }

    fn manager(gateway: Arc<dyn AgentGateway>) -> ConsultationManager {
        ConsultationManager::new(gateway, Arc::new(NullEmitter))
    }

    fn info() -> StakeholderInfo {
        StakeholderInfo {
            name: "Sam Lee".to_string(),
            role: "Teacher".to_string(),
            department: "Nursing".to_string(),
            email: Some("sam@example.edu".to_string()),
        }
    }

    #[tokio::test]
    async fn test_intake_requests_opening() {
        let manager = manager(Arc::new(EchoGateway));
        let id = manager.create(ConsultationTool::Risk).id;

        let view = manager.submit_intake(&id, info()).await.unwrap();
        assert_eq!(view.phase, ConsultationPhase::Conversing);
        assert_eq!(view.turns.len(), 1);
        assert!(view.turns[0].text.starts_with("You said:"));
        assert_eq!(view.agent_session_id.as_deref(), Some("agent-1"));
        assert!(!view.busy);
    }

    #[tokio::test]
    async fn test_failed_opening_never_leaves_transcript_empty() {
        let manager = manager(Arc::new(FailingGateway));
        let id = manager.create(ConsultationTool::Engagement).id;

        let view = manager.submit_intake(&id, info()).await.unwrap();
        assert_eq!(view.turns.len(), 1);
        assert!(view.turns[0].text.contains("Jordan"));
    }

    #[tokio::test]
    async fn test_send_message_on_failure_appends_apology() {
        let manager = manager(Arc::new(FailingGateway));
        let id = manager.create(ConsultationTool::Delivery).id;
        manager.submit_intake(&id, info()).await.unwrap();

        let result = manager.send_message(&id, "hello").await.unwrap();
        assert_eq!(result.assistant_turn.text, ConsultationTool::Delivery.apology());

        let view = manager.get(&id).unwrap();
        assert_eq!(view.turns.len(), 3);
        assert!(!view.busy);
    }

    #[tokio::test]
    async fn test_unknown_consultation() {
        let manager = manager(Arc::new(EchoGateway));
        assert_eq!(
            manager.send_message("missing", "hi").await.unwrap_err(),
            ConsultationError::NotFound("missing".to_string())
        );
    }

    #[tokio::test]
    async fn test_close_all() {
        let manager = manager(Arc::new(EchoGateway));
        manager.create(ConsultationTool::Priority);
        manager.create(ConsultationTool::Capacity);
        assert_eq!(manager.open_count(), 2);
        assert_eq!(manager.close_all(), 2);
        assert_eq!(manager.open_count(), 0);
    }
}
