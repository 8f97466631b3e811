//! Stage entry guards and forward-validation outcomes.
//!
//! Guards check upstream artifacts in flow order and redirect to the stage
//! that produces the first one missing:
//!
//! | Artifact                         | Produced by        |
//! |----------------------------------|--------------------|
//! | `selectedTraining` (non-empty)   | program selection  |
//! | `studentdata.department`         | program selection  |
//! | `trainingDurations` (non-empty)  | duration selection |

use serde::Serialize;
use tc_core::billing::DurationSelectionMap;
use tc_core::stage::Stage;
use tc_core::types::ProgramId;
use tc_session::{SessionData, StoreError};

/// Result of a stage's entry guard.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEntry<T> {
    /// Upstream data is present; the stage can render.
    Ready(T),
    /// Upstream data is missing; go to this stage instead.
    Redirect(Stage),
}

impl<T> StageEntry<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn redirect_target(&self) -> Option<Stage> {
        match self {
            Self::Ready(_) => None,
            Self::Redirect(stage) => Some(*stage),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StageEntry<U> {
        match self {
            Self::Ready(value) => StageEntry::Ready(f(value)),
            Self::Redirect(stage) => StageEntry::Redirect(stage),
        }
    }
}

/// Result of a stage's `confirm_and_advance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmOutcome {
    /// Selections were persisted and the user was sent to `next`.
    Advanced { next: Stage },
    /// Selections are incomplete; nothing was written.
    Invalid {
        message: &'static str,
        missing: Vec<ProgramId>,
    },
    /// The stage was torn down; nothing was written.
    TornDown,
}

// ---------------------------------------------------------------------------
// Guard inputs
// ---------------------------------------------------------------------------

/// What the subject stage needs from upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectEntry {
    pub programs: Vec<ProgramId>,
    pub department: String,
}

/// What the payment stage needs from upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEntry {
    pub durations: DurationSelectionMap,
    pub payer_email: Option<String>,
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Guard for the subject stage: selected programs and a department.
pub fn subject_entry(data: &SessionData) -> Result<StageEntry<SubjectEntry>, StoreError> {
    let Some(programs) = selected_programs(data)? else {
        return Ok(StageEntry::Redirect(Stage::ProgramSelection));
    };

    let department = data
        .student_profile()?
        .and_then(|p| p.department().map(str::to_string));
    let Some(department) = department else {
        return Ok(StageEntry::Redirect(Stage::ProgramSelection));
    };

    Ok(StageEntry::Ready(SubjectEntry {
        programs,
        department,
    }))
}

/// Guard for the duration stage: selected programs only.
///
/// Subject selections are deliberately not required.
pub fn duration_entry(data: &SessionData) -> Result<StageEntry<Vec<ProgramId>>, StoreError> {
    Ok(match selected_programs(data)? {
        Some(programs) => StageEntry::Ready(programs),
        None => StageEntry::Redirect(Stage::ProgramSelection),
    })
}

/// Guard for the payment stage: selected programs and chosen durations.
pub fn payment_entry(data: &SessionData) -> Result<StageEntry<PaymentEntry>, StoreError> {
    if selected_programs(data)?.is_none() {
        return Ok(StageEntry::Redirect(Stage::ProgramSelection));
    }

    let durations = match data.training_durations()? {
        Some(durations) if !durations.is_empty() => durations,
        _ => return Ok(StageEntry::Redirect(Stage::DurationSelection)),
    };

    let payer_email = data
        .student_profile()?
        .and_then(|p| p.email)
        .filter(|e| !e.trim().is_empty());

    Ok(StageEntry::Ready(PaymentEntry {
        durations,
        payer_email,
    }))
}

/// Selected program ids with duplicates dropped, or `None` when absent or empty.
fn selected_programs(data: &SessionData) -> Result<Option<Vec<ProgramId>>, StoreError> {
    let Some(raw) = data.selected_training()? else {
        return Ok(None);
    };

    let mut programs: Vec<ProgramId> = Vec::with_capacity(raw.len());
    for id in raw {
        if !programs.contains(&id) {
            programs.push(id);
        }
    }

    Ok((!programs.is_empty()).then_some(programs))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
