//! Enrollment phase state machine.
//!
//! A session moves linearly through seven phases:
//!
//! ```text
//! ProgramSelected -> SubjectsPending -> SubjectsConfirmed -> DurationPending
//!   -> DurationConfirmed -> PaymentPending -> PaymentSucceeded
//! ```
//!
//! Ordinary transitions move exactly one phase forward or back. Rewinds to
//! an earlier phase happen when a stage's precondition is missing, and are
//! always allowed (see [`EnrollmentPhase::can_rewind_to`]).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::stage::Stage;

/// Where a session currently is in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentPhase {
    ProgramSelected,
    SubjectsPending,
    SubjectsConfirmed,
    DurationPending,
    DurationConfirmed,
    PaymentPending,
    PaymentSucceeded,
}

/// Phases in flow order.
const ORDER: [EnrollmentPhase; 7] = [
    EnrollmentPhase::ProgramSelected,
    EnrollmentPhase::SubjectsPending,
    EnrollmentPhase::SubjectsConfirmed,
    EnrollmentPhase::DurationPending,
    EnrollmentPhase::DurationConfirmed,
    EnrollmentPhase::PaymentPending,
    EnrollmentPhase::PaymentSucceeded,
];

impl EnrollmentPhase {
    fn index(self) -> usize {
        // ORDER lists every variant, so the lookup always succeeds.
        ORDER.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Option<Self> {
        ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| ORDER[i])
    }

    pub fn is_terminal(self) -> bool {
        self == Self::PaymentSucceeded
    }

    /// Phase a session is in right after a stage becomes ready.
    pub fn on_entering(stage: Stage) -> Self {
        match stage {
            Stage::ProgramSelection => Self::ProgramSelected,
            Stage::SubjectSelection => Self::SubjectsPending,
            Stage::DurationSelection => Self::DurationPending,
            Stage::PaymentSelection => Self::PaymentPending,
            Stage::Dashboard => Self::PaymentSucceeded,
        }
    }

    /// Stage whose page is shown while in this phase.
    ///
    /// Confirmed phases map to the stage the user is being sent to next.
    pub fn stage(self) -> Stage {
        match self {
            Self::ProgramSelected => Stage::ProgramSelection,
            Self::SubjectsPending => Stage::SubjectSelection,
            Self::SubjectsConfirmed | Self::DurationPending => Stage::DurationSelection,
            Self::DurationConfirmed | Self::PaymentPending => Stage::PaymentSelection,
            Self::PaymentSucceeded => Stage::Dashboard,
        }
    }

    /// Rewinding to an earlier (or the same) phase is always permitted.
    pub fn can_rewind_to(self, target: Self) -> bool {
        target <= self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgramSelected => "program_selected",
            Self::SubjectsPending => "subjects_pending",
            Self::SubjectsConfirmed => "subjects_confirmed",
            Self::DurationPending => "duration_pending",
            Self::DurationConfirmed => "duration_confirmed",
            Self::PaymentPending => "payment_pending",
            Self::PaymentSucceeded => "payment_succeeded",
        }
    }
}

/// Validate an ordinary phase transition.
///
/// A transition is valid if `next` is exactly one phase forward or one
/// phase backward from `current`. Nothing leaves `PaymentSucceeded`.
pub fn validate_phase_transition(
    current: EnrollmentPhase,
    next: EnrollmentPhase,
) -> Result<(), CoreError> {
    if current.is_terminal() {
        return Err(CoreError::Conflict(
            "Enrollment payment already succeeded".to_string(),
        ));
    }

    let diff = next.index() as i16 - current.index() as i16;
    if diff != 1 && diff != -1 {
        return Err(CoreError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
