use std::sync::Arc;

use tc_catalog::CatalogApi;
use tc_enrollment::{EnrollmentConfig, RecordingNavigator, SessionDeps};
use tc_events::EventBus;

use crate::config::ServerConfig;
use crate::sessions::SessionRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Catalog the stages load programs and subjects from.
    pub catalog: Arc<dyn CatalogApi>,
    /// Centralized event bus for enrollment events.
    pub event_bus: Arc<EventBus>,
    /// Live enrollment sessions.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        catalog: Arc<dyn CatalogApi>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            event_bus,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    /// Collaborators for a new session. The registry swaps in the
    /// session's own navigator.
    pub fn session_deps(&self) -> SessionDeps {
        SessionDeps {
            catalog: Arc::clone(&self.catalog),
            navigator: Arc::new(RecordingNavigator::new()),
            events: Arc::clone(&self.event_bus),
            config: Arc::new(self.enrollment_config().clone()),
        }
    }

    pub fn enrollment_config(&self) -> &EnrollmentConfig {
        &self.config.enrollment
    }
}
