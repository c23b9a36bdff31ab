// Graceful shutdown handling for signal trapping

use crate::consultation::ConsultationManager;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared shutdown state across the application
#[derive(Clone)]
pub struct ShutdownState {
    /// Flag indicating shutdown has been requested
    shutdown_requested: Arc<AtomicBool>,
    /// Flag indicating cleanup has completed
    cleanup_complete: Arc<AtomicBool>,
}

impl ShutdownState {
    /// Create a new shutdown state
    pub fn new() -> Self {
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            cleanup_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request a shutdown
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        log::info!("Shutdown requested");
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Mark cleanup as complete
    pub fn mark_cleanup_complete(&self) {
        self.cleanup_complete.store(true, Ordering::SeqCst);
        log::info!("Cleanup complete");
    }

    /// Check if cleanup is complete
    pub fn is_cleanup_complete(&self) -> bool {
        self.cleanup_complete.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of graceful shutdown cleanup
#[derive(Debug, Clone, Default)]
pub struct ShutdownResult {
    /// Number of consultations that were closed
    pub consultations_closed: usize,
    /// Consultations with conversation that were never saved to the store
    pub unsaved: Vec<String>,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl ShutdownResult {
    /// Check if shutdown was clean (no errors)
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Close every open consultation, noting the ones whose conversation is lost
pub fn close_consultations(manager: &ConsultationManager) -> ShutdownResult {
    let mut result = ShutdownResult::default();

    for id in manager.ids() {
        let unsaved = manager
            .with_consultation(&id, |c| {
                c.persisted_session_id().is_none() && !c.turns().is_empty()
            })
            .unwrap_or(false);

        match manager.close(&id) {
            Ok(()) => {
                result.consultations_closed += 1;
                if unsaved {
                    result.unsaved.push(id);
                }
            }
            Err(e) => result.errors.push(format!("{}: {}", id, e)),
        }
    }

    result
}

/// Perform graceful shutdown: request it, run the cleanup and log the outcome
pub fn handle_shutdown<F>(state: &ShutdownState, cleanup_fn: F) -> ShutdownResult
where
    F: FnOnce() -> ShutdownResult,
{
    state.request_shutdown();

    log::info!("Starting graceful shutdown...");

    let result = cleanup_fn();

    log::info!(
        "Shutdown complete: {} consultations closed, {} unsaved",
        result.consultations_closed,
        result.unsaved.len()
    );

    for id in &result.unsaved {
        log::warn!("Consultation {} closed without being saved", id);
    }

    for error in &result.errors {
        log::warn!("Cleanup error: {}", error);
    }

    state.mark_cleanup_complete();
    result
}

/// Register signal handlers for graceful shutdown
/// This sets up handlers for SIGINT (Ctrl+C), SIGTERM, and SIGHUP
#[cfg(unix)]
pub fn register_signal_handlers(state: ShutdownState) -> Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::thread;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
        .map_err(|e| anyhow::anyhow!("Failed to register signal handlers: {}", e))?;

    thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGINT => {
                    log::info!("Received SIGINT (Ctrl+C)");
                    state.request_shutdown();
                }
                SIGTERM => {
                    log::info!("Received SIGTERM");
                    state.request_shutdown();
                }
                SIGHUP => {
                    log::info!("Received SIGHUP");
                    state.request_shutdown();
                }
                _ => {}
            }
        }
    });

    log::info!("Signal handlers registered (SIGINT, SIGTERM, SIGHUP)");
    Ok(())
}

/// Register signal handlers for Windows
#[cfg(windows)]
pub fn register_signal_handlers(state: ShutdownState) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C");
        state.request_shutdown();
    })
    .map_err(|e| anyhow::anyhow!("Failed to register Ctrl+C handler: {}", e))?;

    log::info!("Signal handler registered (Ctrl+C)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consultation::NullEmitter;
    use crate::gateway::{AgentGateway, AgentReply, AgentRequest, GatewayError};
    use crate::models::{ConsultationTool, StakeholderInfo};
    use async_trait::async_trait;

    struct OpeningGateway;

    #[async_trait]
    impl AgentGateway for OpeningGateway {
        async fn send(
            &self,
            _tool: ConsultationTool,
            _request: AgentRequest,
        ) -> Result<AgentReply, GatewayError> {
            Ok(AgentReply {
                message: "Welcome".to_string(),
                data: None,
                session_id: None,
                interactive_question_data: None,
            })
        }
    }

    #[test]
    fn test_request_shutdown() {
        let state = ShutdownState::new();
        assert!(!state.is_shutdown_requested());

        state.request_shutdown();
        assert!(state.is_shutdown_requested());
    }

    #[test]
    fn test_shutdown_state_clone() {
        let state1 = ShutdownState::new();
        let state2 = state1.clone();

        state1.request_shutdown();
        // Both should reflect the change since they share Arc
        assert!(state2.is_shutdown_requested());
    }

    #[test]
    fn test_handle_shutdown_with_errors() {
        let state = ShutdownState::new();

        let result = handle_shutdown(&state, || ShutdownResult {
            consultations_closed: 1,
            unsaved: vec![],
            errors: vec!["c-1: not found".to_string()],
        });

        assert!(!result.is_clean());
        assert!(state.is_shutdown_requested());
        assert!(state.is_cleanup_complete());
    }

    #[tokio::test]
    async fn test_close_consultations_reports_unsaved() {
        let manager = ConsultationManager::new(Arc::new(OpeningGateway), Arc::new(NullEmitter));
        let idle = manager.create(ConsultationTool::Risk);
        let talked = manager.create(ConsultationTool::Capacity);
        manager
            .submit_intake(
                &talked.id,
                StakeholderInfo {
                    name: "Sam Lee".to_string(),
                    role: "Teacher".to_string(),
                    department: "Health".to_string(),
                    email: None,
                },
            )
            .await
            .unwrap();

        let result = close_consultations(&manager);
        assert_eq!(result.consultations_closed, 2);
        assert_eq!(result.unsaved, vec![talked.id]);
        assert!(!result.unsaved.contains(&idle.id));
        assert_eq!(manager.open_count(), 0);
        assert!(result.is_clean());
    }
}
