//! WebSocket event broadcaster for real-time updates
//!
//! Consultation events are fanned out over one broadcast channel. A client
//! connecting with `?session=<id>` only receives that consultation's events,
//! and its socket is closed once the consultation emits `closed`. Clients
//! answer embedded questions by sending `selectOption` messages back.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use super::ServerAppState;
use crate::consultation::events::EVENT_CLOSED;

pub const EVENT_ERROR: &str = "consultation:error";

/// A server event that can be broadcast to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEvent {
    /// Event type (e.g., "consultation:turn", "consultation:closed")
    pub event: String,
    /// Event payload as JSON value
    pub payload: serde_json::Value,
}

impl ServerEvent {
    /// Consultation the event belongs to, if any
    pub fn consultation_id(&self) -> Option<&str> {
        self.payload.get("consultationId").and_then(|v| v.as_str())
    }

    fn is_for(&self, session: Option<&str>) -> bool {
        match session {
            Some(id) => self.consultation_id() == Some(id),
            None => true,
        }
    }
}

/// Broadcasts events to all connected WebSocket clients
pub struct EventBroadcaster {
    tx: broadcast::Sender<ServerEvent>,
}

impl EventBroadcaster {
    /// Create a new event broadcaster with a channel capacity of 1000 events
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1000);
        Self { tx }
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast(&self, event_type: &str, payload: impl Serialize) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to serialize {} event: {}", event_type, e);
                serde_json::Value::Null
            }
        };
        let event = ServerEvent {
            event: event_type.to_string(),
            payload,
        };

        // Ignore send errors (no receivers)
        let _ = self.tx.send(event);
    }

    /// Subscribe to events (returns a receiver)
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters of the events socket
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Restrict the stream to one consultation
    pub session: Option<String>,
}

/// Messages a browser may send over the events socket
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Answer the active embedded question
    #[serde(rename_all = "camelCase")]
    SelectOption {
        /// Falls back to the socket's session when omitted
        #[serde(default)]
        consultation_id: Option<String>,
        option: String,
    },
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<EventsQuery>,
    State(state): State<ServerAppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state, query.session))
}

/// Handle a WebSocket connection
async fn handle_websocket(socket: WebSocket, state: ServerAppState, session: Option<String>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to broadcast events
    let mut event_rx = state.broadcaster.subscribe();
    // Replies meant only for this client
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServerEvent>();

    log::info!(
        "WebSocket client connected (session: {})",
        session.as_deref().unwrap_or("all")
    );

    // Forward broadcast events and direct replies to this client
    let filter = session.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                received = event_rx.recv() => match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("WebSocket client lagged, skipped {} events", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(reply) = reply_rx.recv() => reply,
            };

            if !event.is_for(filter.as_deref()) {
                continue;
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    log::warn!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }

            // A closed consultation ends its scoped subscription
            if filter.is_some() && event.event == EVENT_CLOSED {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    });

    loop {
        let msg = tokio::select! {
            _ = &mut send_task => break,
            incoming = receiver.next() => match incoming {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    log::warn!("WebSocket error: {}", e);
                    break;
                }
                None => break,
            },
        };

        match msg {
            Message::Ping(data) => {
                // Pong is handled automatically by axum
                log::trace!("Received ping: {:?}", data);
            }
            Message::Pong(_) => {
                log::trace!("Received pong");
            }
            Message::Text(text) => {
                handle_client_message(&state, session.as_deref(), &text, reply_tx.clone());
            }
            Message::Close(_) => {
                log::info!("WebSocket client disconnected");
                break;
            }
            _ => {}
        }
    }

    // Clean up
    send_task.abort();
    log::info!("WebSocket connection closed");
}

/// Dispatch one inbound text frame; slow work runs on its own task
fn handle_client_message(
    state: &ServerAppState,
    session: Option<&str>,
    text: &str,
    reply_tx: mpsc::UnboundedSender<ServerEvent>,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            log::debug!("Ignoring unrecognised WebSocket message: {}", e);
            return;
        }
    };

    match message {
        ClientMessage::SelectOption {
            consultation_id,
            option,
        } => {
            let Some(id) = consultation_id.or_else(|| session.map(str::to_string)) else {
                log::debug!("selectOption without a consultation id ignored");
                return;
            };

            let manager = state.manager.clone();
            tokio::spawn(async move {
                // Success is reported through the regular turn events
                if let Err(e) = manager.select_option(&id, &option).await {
                    let _ = reply_tx.send(ServerEvent {
                        event: EVENT_ERROR.to_string(),
                        payload: serde_json::json!({
                            "consultationId": id,
                            "error": e.to_string(),
                        }),
                    });
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_broadcaster() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.broadcast(
            "consultation:busy",
            serde_json::json!({"consultationId": "c-1", "busy": true}),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "consultation:busy");
        assert_eq!(event.consultation_id(), Some("c-1"));
    }

    #[test]
    fn test_session_filter() {
        let event = ServerEvent {
            event: "consultation:turn".to_string(),
            payload: serde_json::json!({"consultationId": "c-1"}),
        };
        assert!(event.is_for(None));
        assert!(event.is_for(Some("c-1")));
        assert!(!event.is_for(Some("c-2")));
    }

    #[test]
    fn test_server_event_serialization() {
        let event = ServerEvent {
            event: "consultation:summary".to_string(),
            payload: serde_json::json!({
                "consultationId": "c-123",
                "summary": {"totalRecords": 2}
            }),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("consultation:summary"));
        assert!(json.contains("c-123"));
    }

    #[test]
    fn test_client_message_parsing() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"type":"selectOption","option":"Staffing"}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::SelectOption {
                consultation_id: None,
                option: "Staffing".to_string(),
            }
        );

        let scoped: ClientMessage = serde_json::from_str(
            r#"{"type":"selectOption","consultationId":"c-9","option":"Yes"}"#,
        )
        .unwrap();
        assert!(matches!(
            scoped,
            ClientMessage::SelectOption { consultation_id: Some(ref id), .. } if id == "c-9"
        ));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"unknown"}"#).is_err());
    }
}
