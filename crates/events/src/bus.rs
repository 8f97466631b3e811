//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between every enrollment
//! session. Publishing never blocks and never fails the publisher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tc_core::stage::Stage;
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

pub const STAGE_ENTERED: &str = "stage.entered";
pub const STAGE_REDIRECTED: &str = "stage.redirected";
pub const SUBJECTS_CONFIRMED: &str = "subjects.confirmed";
pub const DURATIONS_CONFIRMED: &str = "durations.confirmed";
pub const CATALOG_DEGRADED: &str = "catalog.degraded";
pub const PAYMENT_GATEWAY_SELECTED: &str = "payment.gateway_selected";
pub const PAYMENT_SUCCEEDED: &str = "payment.succeeded";
pub const PAYMENT_CLOSED: &str = "payment.closed";

// ---------------------------------------------------------------------------
// EnrollmentEvent
// ---------------------------------------------------------------------------

/// Something that happened inside an enrollment session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentEvent {
    /// Dot-separated event name, e.g. `"subjects.confirmed"`.
    pub event_type: String,

    /// Session the event belongs to.
    pub session_id: Option<Uuid>,

    /// Stage that emitted the event.
    pub stage: Option<Stage>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl EnrollmentEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            session_id: None,
            stage: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<EnrollmentEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: EnrollmentEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EnrollmentEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let session_id = Uuid::new_v4();

        bus.publish(
            EnrollmentEvent::new(SUBJECTS_CONFIRMED)
                .with_session(session_id)
                .with_stage(Stage::SubjectSelection)
                .with_payload(serde_json::json!({"programs": 2})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, SUBJECTS_CONFIRMED);
        assert_eq!(received.session_id, Some(session_id));
        assert_eq!(received.stage, Some(Stage::SubjectSelection));
        assert_eq!(received.payload["programs"], 2);
    }

    #[tokio::test]
    async fn every_subscriber_receives() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(EnrollmentEvent::new(PAYMENT_CLOSED));

        assert_eq!(rx1.recv().await.unwrap().event_type, PAYMENT_CLOSED);
        assert_eq!(rx2.recv().await.unwrap().event_type, PAYMENT_CLOSED);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(EnrollmentEvent::new("orphan.event"));
    }

    #[test]
    fn bare_event_has_empty_optional_fields() {
        let event = EnrollmentEvent::new(STAGE_ENTERED);
        assert!(event.session_id.is_none());
        assert!(event.stage.is_none());
        assert!(event.payload.is_object());
    }
}
