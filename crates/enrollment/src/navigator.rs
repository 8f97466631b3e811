//! Navigation seam.
//!
//! The wizard never routes by itself; it asks a [`Navigator`] to move the
//! user to a [`Stage`]. The HTTP layer uses [`RecordingNavigator`] and
//! reports the last navigation back to the client.

use std::sync::Mutex;

use tc_core::stage::Stage;

pub trait Navigator: Send + Sync {
    fn navigate(&self, to: Stage);
}

/// Navigator that remembers every navigation in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Stage>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Stage> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Stage> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .copied()
    }

    /// Number of navigations to `stage`.
    pub fn count(&self, stage: Stage) -> usize {
        self.history().iter().filter(|s| **s == stage).count()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, to: Stage) {
        tracing::debug!(path = to.path(), "Navigate");
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(to);
    }
}
