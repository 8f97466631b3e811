//! Event log writer.
//!
//! [`EventLogger`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes every [`EnrollmentEvent`] to the tracing log. It runs as a
//! long-lived background task and exits when the bus is dropped.

use tokio::sync::broadcast;

use crate::bus::EnrollmentEvent;

pub struct EventLogger;

impl EventLogger {
    /// Run the logging loop until the channel closes.
    ///
    /// Returns the number of events logged.
    pub async fn run(mut receiver: broadcast::Receiver<EnrollmentEvent>) -> u64 {
        let mut logged = 0u64;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        event_type = %event.event_type,
                        session_id = ?event.session_id,
                        stage = ?event.stage,
                        payload = %event.payload,
                        "Enrollment event"
                    );
                    logged += 1;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(logged, "Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
        logged
    }
}
