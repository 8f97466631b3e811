//! Catalog records and the per-program subject limit policy.
//!
//! A [`Program`] is a training track (an examination type such as JAMB or
//! WAEC). Each program offers [`Subject`]s scoped to the student's
//! department. How many subjects a student may take in a program is decided
//! by [`subject_limit`], a pure function of the program title.

use serde::{Deserialize, Serialize};

use crate::types::{ProgramId, SubjectId};

// ---------------------------------------------------------------------------
// Limit policy
// ---------------------------------------------------------------------------

/// Title fragment (lowercase) identifying the JAMB track.
pub const JAMB_TITLE_MARKER: &str = "jamb";

/// Maximum subjects selectable for a JAMB program.
pub const JAMB_SUBJECT_LIMIT: usize = 4;

/// Maximum subjects selectable for every other program.
pub const DEFAULT_SUBJECT_LIMIT: usize = 9;

/// Maximum number of subjects a student may select for a program.
///
/// Returns [`JAMB_SUBJECT_LIMIT`] when the title contains "jamb" in any
/// letter case, otherwise [`DEFAULT_SUBJECT_LIMIT`].
pub fn subject_limit(title: &str) -> usize {
    if title.to_lowercase().contains(JAMB_TITLE_MARKER) {
        JAMB_SUBJECT_LIMIT
    } else {
        DEFAULT_SUBJECT_LIMIT
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A training program as returned by the catalog's `courses` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub title: String,
}

impl Program {
    pub fn new(id: ProgramId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    /// Stand-in record for a selected program the catalog did not return.
    ///
    /// The title carries no track marker, so the default limit applies.
    pub fn placeholder(id: ProgramId) -> Self {
        Self {
            id,
            title: format!("Course {id}"),
        }
    }

    /// Subject limit for this program.
    pub fn subject_limit(&self) -> usize {
        subject_limit(&self.title)
    }
}

/// A subject offered by a program for a given department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
}

impl Subject {
    pub fn new(id: SubjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Order `catalog` to follow `selected`, keeping only selected programs.
///
/// Programs the catalog does not know about are replaced with
/// [`Program::placeholder`] so every selected id is still represented.
pub fn resolve_selected_programs(selected: &[ProgramId], catalog: &[Program]) -> Vec<Program> {
    selected
        .iter()
        .map(|id| {
            catalog
                .iter()
                .find(|p| p.id == *id)
                .cloned()
                .unwrap_or_else(|| Program::placeholder(*id))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
