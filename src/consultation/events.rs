// Consultation events pushed to connected browsers

use crate::models::{ConversationTurn, SummaryRecord};
use crate::server::EventBroadcaster;
use serde::Serialize;
use std::sync::Arc;

use super::SummaryView;

pub const EVENT_TURN: &str = "consultation:turn";
pub const EVENT_SUMMARY: &str = "consultation:summary";
pub const EVENT_BUSY: &str = "consultation:busy";
pub const EVENT_CLOSED: &str = "consultation:closed";

/// Typed event scoped to one consultation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConsultationEvent {
    #[serde(rename_all = "camelCase")]
    Turn {
        consultation_id: String,
        turn: ConversationTurn,
    },
    #[serde(rename_all = "camelCase")]
    Summary {
        consultation_id: String,
        added: Vec<SummaryRecord>,
        summary: SummaryView,
    },
    #[serde(rename_all = "camelCase")]
    Busy { consultation_id: String, busy: bool },
    #[serde(rename_all = "camelCase")]
    Closed { consultation_id: String },
}

impl ConsultationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ConsultationEvent::Turn { .. } => EVENT_TURN,
            ConsultationEvent::Summary { .. } => EVENT_SUMMARY,
            ConsultationEvent::Busy { .. } => EVENT_BUSY,
            ConsultationEvent::Closed { .. } => EVENT_CLOSED,
        }
    }

    pub fn consultation_id(&self) -> &str {
        match self {
            ConsultationEvent::Turn { consultation_id, .. }
            | ConsultationEvent::Summary { consultation_id, .. }
            | ConsultationEvent::Busy { consultation_id, .. }
            | ConsultationEvent::Closed { consultation_id } => consultation_id,
        }
    }
}

/// Trait for emitting consultation events
pub trait ConsultationEmitter: Send + Sync {
    fn emit(&self, event: ConsultationEvent);
}

/// Broadcast-based event emitter for WebSocket clients
pub struct BroadcastEmitter {
    broadcaster: Arc<EventBroadcaster>,
}

impl BroadcastEmitter {
    pub fn new(broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { broadcaster }
    }
}

impl ConsultationEmitter for BroadcastEmitter {
    fn emit(&self, event: ConsultationEvent) {
        self.broadcaster.broadcast(event.name(), &event);
    }
}

/// Emitter that drops every event
pub struct NullEmitter;

impl ConsultationEmitter for NullEmitter {
    fn emit(&self, _event: ConsultationEvent) {}
}
