//! Subject selections keyed by program.
//!
//! [`SubjectSelectionMap`] is the artifact the subject stage builds and
//! persists under `trainingSubjects`. It serializes as a JSON object keyed
//! by program id, each value a list of `{id, name}` subjects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::program::Subject;
use crate::types::{ProgramId, SubjectId};

/// Result of toggling a subject in a program's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The program is already at its limit; the selection is unchanged.
    LimitReached,
    /// The program has no selection entry; the selection is unchanged.
    UnknownProgram,
}

/// Chosen subjects per program, unique by subject id within a program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectSelectionMap(BTreeMap<ProgramId, Vec<Subject>>);

impl SubjectSelectionMap {
    /// A map with an empty selection for each of `programs`.
    pub fn empty_for(programs: impl IntoIterator<Item = ProgramId>) -> Self {
        Self(programs.into_iter().map(|id| (id, Vec::new())).collect())
    }

    /// Selected subjects for `program`, empty if the program is unknown.
    pub fn selected(&self, program: ProgramId) -> &[Subject] {
        self.0.get(&program).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_selected(&self, program: ProgramId, subject_id: SubjectId) -> bool {
        self.selected(program).iter().any(|s| s.id == subject_id)
    }

    /// Toggle `subject` for `program` under `limit`.
    ///
    /// Removes the subject if already selected, adds it if the program is
    /// below its limit, and otherwise leaves the selection untouched.
    pub fn toggle(&mut self, program: ProgramId, subject: Subject, limit: usize) -> ToggleOutcome {
        let Some(current) = self.0.get_mut(&program) else {
            return ToggleOutcome::UnknownProgram;
        };

        if let Some(pos) = current.iter().position(|s| s.id == subject.id) {
            current.remove(pos);
            return ToggleOutcome::Removed;
        }

        if current.len() >= limit {
            return ToggleOutcome::LimitReached;
        }

        current.push(subject);
        ToggleOutcome::Added
    }

    /// Programs from `required` that have no selected subject.
    pub fn incomplete_programs(&self, required: &[ProgramId]) -> Vec<ProgramId> {
        required
            .iter()
            .copied()
            .filter(|id| self.selected(*id).is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProgramId, &Vec<Subject>)> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
