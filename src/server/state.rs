//! Server application state shared across handlers

use super::events::EventBroadcaster;
use crate::config::{ConfigState, ConsultConfig};
use crate::consultation::{BroadcastEmitter, ConsultationManager};
use crate::export::{CommandPdfRenderer, PdfRenderer};
use crate::gateway::{AgentGateway, HttpAgentGateway};
use crate::persistence::{ConsultationStore, PostgrestStore};
use crate::shutdown::ShutdownState;
use std::sync::Arc;

/// Shared state for the server, holding the consultation manager and the
/// external collaborators it talks to.
#[derive(Clone)]
pub struct ServerAppState {
    /// Authentication token for this session
    pub auth_token: String,

    /// Configuration state
    pub config_state: Arc<ConfigState>,

    /// Shutdown state
    pub shutdown_state: ShutdownState,

    /// Event broadcaster for WebSocket clients
    pub broadcaster: Arc<EventBroadcaster>,

    /// Open consultations
    pub manager: Arc<ConsultationManager>,

    /// Hosted store, absent when no store URL/key is configured
    pub store: Option<Arc<dyn ConsultationStore>>,

    /// HTML to PDF converter
    pub pdf_renderer: Arc<dyn PdfRenderer>,
}

impl ServerAppState {
    /// Create the state from explicit collaborators
    pub fn new(
        auth_token: String,
        config_state: ConfigState,
        shutdown_state: ShutdownState,
        broadcaster: Arc<EventBroadcaster>,
        gateway: Arc<dyn AgentGateway>,
        store: Option<Arc<dyn ConsultationStore>>,
        pdf_renderer: Arc<dyn PdfRenderer>,
    ) -> Self {
        let emitter = Arc::new(BroadcastEmitter::new(broadcaster.clone()));
        let manager = Arc::new(ConsultationManager::new(gateway, emitter));

        Self {
            auth_token,
            config_state: Arc::new(config_state),
            shutdown_state,
            broadcaster,
            manager,
            store,
            pdf_renderer,
        }
    }

    /// Wire the HTTP gateway, PostgREST store and command PDF renderer from config
    pub fn from_config(
        auth_token: String,
        config: ConsultConfig,
        shutdown_state: ShutdownState,
    ) -> Result<Self, String> {
        let mut gateway = HttpAgentGateway::new(&config.gateway.base_url)
            .map_err(|e| format!("Failed to create agent gateway: {}", e))?;
        for (tool, path) in config.gateway.tool_paths() {
            gateway = gateway.with_path(tool, path);
        }

        let store: Option<Arc<dyn ConsultationStore>> = match (&config.store.url, &config.store.api_key) {
            (Some(url), Some(key)) if config.store.is_configured() => {
                let store = PostgrestStore::new(url.as_str(), key)
                    .map_err(|e| format!("Failed to create store client: {}", e))?;
                Some(Arc::new(store))
            }
            _ => {
                log::warn!("Store URL or key not configured; saving and admin listing are disabled");
                None
            }
        };

        let pdf_renderer = Arc::new(CommandPdfRenderer::new(
            config.report.pdf_command.clone(),
            config.report.pdf_args.clone(),
        ));

        Ok(Self::new(
            auth_token,
            ConfigState::new(config),
            shutdown_state,
            Arc::new(EventBroadcaster::new()),
            Arc::new(gateway),
            store,
            pdf_renderer,
        ))
    }

    /// The configured store, or an error naming the missing settings
    pub fn require_store(&self) -> Result<Arc<dyn ConsultationStore>, String> {
        self.store.clone().ok_or_else(|| {
            "Store is not configured (set CONSULT_STORE_URL and CONSULT_STORE_KEY)".to_string()
        })
    }
}
