//! In-process registry of live enrollment sessions.
//!
//! Each session sits behind its own `tokio::sync::Mutex`, so requests for
//! one session run one at a time while different sessions proceed in
//! parallel. Every session gets its own in-memory store.
//!
//! Removal cancels the session's token before waiting for its lock, so a
//! request stuck in a slow catalog load ends early instead of holding the
//! removal up.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tc_core::types::Timestamp;
use tc_enrollment::{EnrollmentSession, RecordingNavigator, SessionDeps};
use tc_session::{MemorySessionStore, SessionData};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A live session with the navigator that records where it sent the client.
pub struct SessionHandle {
    pub id: Uuid,
    pub created_at: Timestamp,
    pub navigator: Arc<RecordingNavigator>,
    pub session: Mutex<EnrollmentSession>,
    /// The session's root token, reachable without the lock.
    cancel: CancellationToken,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session backed by a fresh store.
    ///
    /// `deps.navigator` is replaced with the session's own recorder.
    pub async fn create(&self, mut deps: SessionDeps) -> Arc<SessionHandle> {
        let id = Uuid::new_v4();
        let navigator = Arc::new(RecordingNavigator::new());
        deps.navigator = navigator.clone();

        let data = SessionData::new(Arc::new(MemorySessionStore::new()));
        let session = EnrollmentSession::new(id, data, deps);
        let handle = Arc::new(SessionHandle {
            id,
            created_at: Utc::now(),
            navigator,
            cancel: session.cancellation_token(),
            session: Mutex::new(session),
        });

        self.sessions.write().await.insert(id, Arc::clone(&handle));
        tracing::info!(session_id = %id, "Enrollment session created");
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Remove a session and tear down its active stage.
    pub async fn remove(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        let handle = self.sessions.write().await.remove(&id)?;
        handle.cancel.cancel();
        handle.session.lock().await.close();
        Some(handle)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tc_catalog::InMemoryCatalog;
    use tc_core::program::{Program, Subject};
    use tc_enrollment::EnrollmentConfig;
    use tc_events::EventBus;
    use tc_session::StudentProfile;

    use super::*;

    fn deps() -> SessionDeps {
        SessionDeps {
            catalog: Arc::new(InMemoryCatalog::new()),
            navigator: Arc::new(RecordingNavigator::new()),
            events: Arc::new(EventBus::default()),
            config: Arc::new(EnrollmentConfig::default()),
        }
    }

    #[tokio::test]
    async fn create_get_remove() {
        let registry = SessionRegistry::new();
        let handle = registry.create(deps()).await;

        assert_eq!(registry.len().await, 1);
        assert!(registry.get(handle.id).await.is_some());

        let removed = registry.remove(handle.id).await.unwrap();
        assert!(removed.session.lock().await.is_closed());
        assert!(registry.is_empty().await);
        assert!(registry.get(handle.id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn remove_interrupts_a_slow_catalog_load() {
        let registry = SessionRegistry::new();
        let mut deps = deps();
        deps.catalog = Arc::new(
            InMemoryCatalog::new()
                .with_course(Program::new(1, "JAMB"))
                .with_subjects(1, "science", vec![Subject::new(11, "Physics")])
                .with_latency(Duration::from_secs(30)),
        );
        let handle = registry.create(deps).await;
        {
            let session = handle.session.lock().await;
            session.data().set_selected_training(&[1]).unwrap();
            session
                .data()
                .set_student_profile(&StudentProfile::new("science"))
                .unwrap();
        }

        let loading = Arc::clone(&handle);
        let entering =
            tokio::spawn(async move { loading.session.lock().await.enter_subjects().await });
        tokio::time::sleep(Duration::from_secs(1)).await;

        let started = tokio::time::Instant::now();
        let removed = registry.remove(handle.id).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(30));
        assert!(removed.session.lock().await.is_closed());
        assert!(entering.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn sessions_do_not_share_stores() {
        let registry = SessionRegistry::new();
        let a = registry.create(deps()).await;
        let b = registry.create(deps()).await;

        a.session
            .lock()
            .await
            .data()
            .set_selected_training(&[1])
            .unwrap();

        assert_eq!(
            b.session.lock().await.data().selected_training().unwrap(),
            None
        );
    }
}
