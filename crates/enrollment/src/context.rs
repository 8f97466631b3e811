//! Per-stage handle on the session's collaborators.

use std::future::Future;
use std::sync::Arc;

use tc_catalog::CatalogApi;
use tc_core::program::{resolve_selected_programs, Program};
use tc_core::stage::Stage;
use tc_core::types::ProgramId;
use tc_events::bus::{self, EnrollmentEvent, EventBus};
use tc_session::SessionData;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::navigator::Navigator;

/// Selected programs with their catalog titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPrograms {
    /// In selection order, placeholders included.
    pub programs: Vec<Program>,
    /// Ids that fell back to a placeholder title.
    pub unlisted: Vec<ProgramId>,
}

/// Everything a stage needs from the outside world.
///
/// Each stage instance gets its own cancellation token. Once the stage is
/// torn down, pending catalog responses are discarded and the stage no
/// longer writes to the store or navigates.
#[derive(Clone)]
pub struct StageContext {
    pub session_id: Uuid,
    pub data: SessionData,
    navigator: Arc<dyn Navigator>,
    events: Arc<EventBus>,
    cancel: CancellationToken,
}

impl StageContext {
    pub fn new(
        session_id: Uuid,
        data: SessionData,
        navigator: Arc<dyn Navigator>,
        events: Arc<EventBus>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session_id,
            data,
            navigator,
            events,
            cancel,
        }
    }

    pub fn navigate(&self, to: Stage) {
        if self.is_torn_down() {
            tracing::debug!(
                session_id = %self.session_id,
                path = to.path(),
                "Navigation from torn-down stage dropped"
            );
            return;
        }
        self.navigator.navigate(to);
    }

    /// Silently send the user back to `to` because `from`'s data is missing.
    pub fn redirect(&self, from: Stage, to: Stage) {
        tracing::debug!(
            session_id = %self.session_id,
            from = from.path(),
            to = to.path(),
            "Missing upstream data, redirecting"
        );
        self.publish(
            from,
            bus::STAGE_REDIRECTED,
            serde_json::json!({ "to": to }),
        );
        self.navigate(to);
    }

    pub fn publish(&self, stage: Stage, event_type: &str, payload: serde_json::Value) {
        self.events.publish(
            EnrollmentEvent::new(event_type)
                .with_session(self.session_id)
                .with_stage(stage)
                .with_payload(payload),
        );
    }

    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolve titles for `programs` from the catalog's course listing.
    ///
    /// Programs the catalog does not return, or every program when the
    /// listing fails, get a placeholder title and are reported as
    /// unlisted. Returns `None` when torn down.
    pub async fn load_programs(
        &self,
        stage: Stage,
        catalog: &dyn CatalogApi,
        programs: &[ProgramId],
    ) -> Option<LoadedPrograms> {
        let listed = self.unless_torn_down(catalog.list_courses()).await?;
        let courses = match listed {
            Ok(courses) => courses,
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %err,
                    "Course listing failed, using placeholder titles"
                );
                self.publish(
                    stage,
                    bus::CATALOG_DEGRADED,
                    serde_json::json!({ "call": "list_courses", "error": err.to_string() }),
                );
                Vec::new()
            }
        };

        let unlisted: Vec<ProgramId> = programs
            .iter()
            .copied()
            .filter(|id| !courses.iter().any(|course| course.id == *id))
            .collect();
        if !unlisted.is_empty() {
            tracing::debug!(
                session_id = %self.session_id,
                ?unlisted,
                "Programs missing from course listing"
            );
        }

        Some(LoadedPrograms {
            programs: resolve_selected_programs(programs, &courses),
            unlisted,
        })
    }

    /// Await `fut` unless the stage is torn down first.
    ///
    /// Returns `None` when torn down; the future's output, if it ever
    /// arrives, is dropped.
    pub async fn unless_torn_down<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::sync::Arc;

    use tc_events::EventBus;
    use tc_session::{MemorySessionStore, SessionData};
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use super::StageContext;
    use crate::navigator::RecordingNavigator;

    /// A context over a fresh in-memory store, with its navigator.
    pub fn context() -> (StageContext, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new());
        let ctx = StageContext::new(
            Uuid::new_v4(),
            SessionData::new(Arc::new(MemorySessionStore::new())),
            navigator.clone(),
            Arc::new(EventBus::default()),
            CancellationToken::new(),
        );
        (ctx, navigator)
    }
}
