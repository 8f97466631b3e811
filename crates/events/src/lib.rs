//! Enrollment event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EnrollmentEvent`]: the event envelope published by the stages.
//! - [`EventLogger`]: background task writing every event to the log.

pub mod bus;
pub mod logger;

pub use bus::{EnrollmentEvent, EventBus};
pub use logger::EventLogger;
