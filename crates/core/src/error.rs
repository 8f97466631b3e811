use crate::phase::EnrollmentPhase;
use crate::types::DbId;

/// Domain errors shared by every enrollment crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Input the user can correct (unknown duration, missing gateway, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request is valid but the session is in the wrong state for it.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A phase change that skips or repeats a phase.
    #[error("Cannot move from '{}' to '{}'", from.as_str(), to.as_str())]
    InvalidTransition {
        from: EnrollmentPhase,
        to: EnrollmentPhase,
    },
}
