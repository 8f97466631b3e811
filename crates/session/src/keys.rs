//! Session key names and upstream records.
//!
//! | Key                 | Producer                 | Consumer                 |
//! |---------------------|--------------------------|--------------------------|
//! | `selectedTraining`  | program selection        | subject, duration stages |
//! | `studentdata`       | student profile          | subject, payment stages  |
//! | `trainingSubjects`  | subject stage            | downstream (display)     |
//! | `trainingDurations` | duration stage           | payment stage            |

use serde::{Deserialize, Serialize};

/// Ordered list of selected program ids.
pub const SELECTED_TRAINING: &str = "selectedTraining";

/// Student profile written by the registration page.
pub const STUDENT_DATA: &str = "studentdata";

/// Confirmed subjects per program.
pub const TRAINING_SUBJECTS: &str = "trainingSubjects";

/// Confirmed billing duration per program.
pub const TRAINING_DURATIONS: &str = "trainingDurations";

/// Profile fields the wizard reads from `studentdata`.
///
/// Fields the registration page stores beyond these are carried along
/// untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(default)]
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StudentProfile {
    pub fn new(department: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            email: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Department, or `None` when blank.
    pub fn department(&self) -> Option<&str> {
        let dept = self.department.trim();
        (!dept.is_empty()).then_some(dept)
    }
}
