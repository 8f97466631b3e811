//! Fixed-data catalog.
//!
//! Serves programs and subjects from memory. Failures can be injected per
//! program (or for the whole course listing) to exercise degraded loading,
//! and calls are counted so callers can assert on fetch behaviour.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tc_core::program::{Program, Subject};
use tc_core::types::ProgramId;

use crate::api::{CatalogApi, CatalogError};

#[derive(Default)]
pub struct InMemoryCatalog {
    courses: Vec<Program>,
    /// Subjects keyed by `(program, lowercase department)`.
    subjects: HashMap<(ProgramId, String), Vec<Subject>>,
    failing_programs: HashSet<ProgramId>,
    fail_courses: bool,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course(mut self, program: Program) -> Self {
        self.courses.push(program);
        self
    }

    pub fn with_subjects(
        mut self,
        program: ProgramId,
        department: &str,
        subjects: Vec<Subject>,
    ) -> Self {
        self.subjects
            .insert((program, department.to_lowercase()), subjects);
        self
    }

    /// Make `list_subjects` fail for `program`.
    pub fn failing_program(mut self, program: ProgramId) -> Self {
        self.failing_programs.insert(program);
        self
    }

    /// Make `list_courses` fail.
    pub fn failing_courses(mut self) -> Self {
        self.fail_courses = true;
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of catalog calls served so far (successful or not).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CatalogApi for InMemoryCatalog {
    async fn list_courses(&self) -> Result<Vec<Program>, CatalogError> {
        self.begin_call().await;
        if self.fail_courses {
            return Err(CatalogError::Unavailable("course listing disabled".into()));
        }
        Ok(self.courses.clone())
    }

    async fn list_subjects(
        &self,
        program: ProgramId,
        department: &str,
    ) -> Result<Vec<Subject>, CatalogError> {
        self.begin_call().await;
        if self.failing_programs.contains(&program) {
            return Err(CatalogError::Api {
                status: 500,
                body: format!("subjects for course {program} unavailable"),
            });
        }
        Ok(self
            .subjects
            .get(&(program, department.to_lowercase()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_course(Program::new(1, "JAMB"))
            .with_subjects(1, "Science", vec![Subject::new(1, "Physics")])
    }

    #[tokio::test]
    async fn serves_courses_and_subjects() {
        let catalog = catalog();
        assert_eq!(catalog.list_courses().await.unwrap().len(), 1);
        assert_eq!(
            catalog.list_subjects(1, "science").await.unwrap(),
            vec![Subject::new(1, "Physics")]
        );
        assert!(catalog.list_subjects(1, "arts").await.unwrap().is_empty());
        assert_eq!(catalog.call_count(), 3);
    }

    #[tokio::test]
    async fn injected_failures() {
        let catalog = catalog().failing_program(1).failing_courses();
        assert_matches!(
            catalog.list_courses().await,
            Err(CatalogError::Unavailable(_))
        );
        assert_matches!(
            catalog.list_subjects(1, "science").await,
            Err(CatalogError::Api { status: 500, .. })
        );
    }
}
