//! Navigation targets of the enrollment wizard.

use serde::{Deserialize, Serialize};

/// A page of the signup flow that the wizard can navigate to.
///
/// `ProgramSelection` and `Dashboard` belong to other parts of the product;
/// the wizard only ever navigates to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ProgramSelection,
    SubjectSelection,
    DurationSelection,
    PaymentSelection,
    Dashboard,
}

impl Stage {
    /// Client-side route for the stage.
    pub fn path(self) -> &'static str {
        match self {
            Self::ProgramSelection => "/register/student/training/selection",
            Self::SubjectSelection => "/register/student/training/subjects",
            Self::DurationSelection => "/register/student/training/duration",
            Self::PaymentSelection => "/register/student/payment/selection",
            Self::Dashboard => "/student/dashboard",
        }
    }

    /// Stage reached by explicit back navigation, if any.
    pub fn predecessor(self) -> Option<Stage> {
        match self {
            Self::ProgramSelection => None,
            Self::SubjectSelection => Some(Self::ProgramSelection),
            Self::DurationSelection => Some(Self::SubjectSelection),
            Self::PaymentSelection => Some(Self::DurationSelection),
            Self::Dashboard => None,
        }
    }

    /// Human-readable page title.
    pub fn label(self) -> &'static str {
        match self {
            Self::ProgramSelection => "Training Selection",
            Self::SubjectSelection => "Subject Selection",
            Self::DurationSelection => "Training Duration",
            Self::PaymentSelection => "Select Payment Method",
            Self::Dashboard => "Dashboard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predecessors_walk_back_to_program_selection() {
        let mut stage = Stage::PaymentSelection;
        let mut walked = vec![stage];
        while let Some(prev) = stage.predecessor() {
            walked.push(prev);
            stage = prev;
        }
        assert_eq!(
            walked,
            vec![
                Stage::PaymentSelection,
                Stage::DurationSelection,
                Stage::SubjectSelection,
                Stage::ProgramSelection,
            ]
        );
    }

    #[test]
    fn dashboard_has_no_predecessor() {
        assert_eq!(Stage::Dashboard.predecessor(), None);
    }

    #[test]
    fn paths_are_distinct() {
        let stages = [
            Stage::ProgramSelection,
            Stage::SubjectSelection,
            Stage::DurationSelection,
            Stage::PaymentSelection,
            Stage::Dashboard,
        ];
        let mut paths: Vec<&str> = stages.iter().map(|s| s.path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), stages.len());
    }
}
