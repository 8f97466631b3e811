//! Subject selection stage.
//!
//! Loads each selected program's subjects for the student's department and
//! lets the student pick between one and the program's limit of subjects
//! per program. Confirming persists `trainingSubjects` and moves on to
//! duration selection.

use std::collections::HashMap;

use serde::Serialize;
use tc_catalog::CatalogApi;
use tc_core::program::{Program, Subject};
use tc_core::selection::{SubjectSelectionMap, ToggleOutcome};
use tc_core::stage::Stage;
use tc_core::types::{ProgramId, SubjectId};
use tc_events::bus;

use crate::context::{LoadedPrograms, StageContext};
use crate::entry::{self, ConfirmOutcome, StageEntry};
use crate::error::FlowError;

/// Shown when a program has no selected subject on confirm.
pub const SUBJECTS_REQUIRED_MESSAGE: &str =
    "Please select at least one subject for each examination";

pub struct SubjectSelectionStage {
    ctx: StageContext,
    department: String,
    /// Selected programs in selection order.
    programs: Vec<Program>,
    available: HashMap<ProgramId, Vec<Subject>>,
    selection: SubjectSelectionMap,
    degraded: Vec<ProgramId>,
    validation_failed: bool,
}

impl SubjectSelectionStage {
    /// Run the entry guard and, when ready, load the catalog.
    pub async fn enter(
        ctx: StageContext,
        catalog: &dyn CatalogApi,
    ) -> Result<StageEntry<Self>, FlowError> {
        let upstream = match entry::subject_entry(&ctx.data)? {
            StageEntry::Ready(upstream) => upstream,
            StageEntry::Redirect(to) => {
                ctx.redirect(Stage::SubjectSelection, to);
                return Ok(StageEntry::Redirect(to));
            }
        };

        ctx.publish(
            Stage::SubjectSelection,
            bus::STAGE_ENTERED,
            serde_json::json!({ "programs": upstream.programs }),
        );

        let mut stage = Self {
            programs: upstream
                .programs
                .iter()
                .map(|id| Program::placeholder(*id))
                .collect(),
            selection: SubjectSelectionMap::empty_for(upstream.programs.iter().copied()),
            department: upstream.department,
            available: HashMap::new(),
            degraded: Vec::new(),
            validation_failed: false,
            ctx,
        };
        stage.load_catalog(catalog).await;

        Ok(StageEntry::Ready(stage))
    }

    /// Fetch program titles, then each program's subjects in order.
    ///
    /// A failed call degrades only the program it was for. Programs without
    /// a catalog title get no subjects, since their limit is unknown. Stops
    /// quietly if the stage is torn down mid-load.
    pub async fn load_catalog(&mut self, catalog: &dyn CatalogApi) {
        let ids = self.program_ids();

        let Some(LoadedPrograms { programs, unlisted }) = self
            .ctx
            .load_programs(Stage::SubjectSelection, catalog, &ids)
            .await
        else {
            return;
        };
        self.programs = programs;

        for program in ids {
            if unlisted.contains(&program) {
                tracing::warn!(
                    session_id = %self.ctx.session_id,
                    program,
                    "Program has no catalog title, showing no subjects"
                );
                self.available.insert(program, Vec::new());
                self.degraded.push(program);
                continue;
            }

            let fetched = self
                .ctx
                .unless_torn_down(catalog.list_subjects(program, &self.department))
                .await;

            match fetched {
                None => return,
                Some(Ok(subjects)) => {
                    tracing::debug!(
                        session_id = %self.ctx.session_id,
                        program,
                        count = subjects.len(),
                        "Loaded subjects"
                    );
                    self.available.insert(program, subjects);
                }
                Some(Err(err)) => {
                    tracing::warn!(
                        session_id = %self.ctx.session_id,
                        program,
                        department = %self.department,
                        error = %err,
                        "Subject listing failed, showing no subjects"
                    );
                    self.ctx.publish(
                        Stage::SubjectSelection,
                        bus::CATALOG_DEGRADED,
                        serde_json::json!({
                            "call": "list_subjects",
                            "program": program,
                            "error": err.to_string(),
                        }),
                    );
                    self.available.insert(program, Vec::new());
                    self.degraded.push(program);
                }
            }
        }
    }

    /// Add or remove `subject` from `program`'s selection.
    ///
    /// Adding past the program's limit is rejected without error.
    pub fn toggle_subject(&mut self, program: ProgramId, subject: Subject) -> ToggleOutcome {
        let limit = self
            .program(program)
            .map(Program::subject_limit)
            .unwrap_or_default();
        let outcome = self.selection.toggle(program, subject, limit);
        if outcome == ToggleOutcome::LimitReached {
            tracing::debug!(
                session_id = %self.ctx.session_id,
                program,
                limit,
                "Subject limit reached"
            );
        }
        outcome
    }

    /// Persist the selection and advance, or flag which programs are empty.
    pub fn confirm_and_advance(&mut self) -> Result<ConfirmOutcome, FlowError> {
        if self.ctx.is_torn_down() {
            return Ok(ConfirmOutcome::TornDown);
        }

        let missing = self.selection.incomplete_programs(&self.program_ids());
        if !missing.is_empty() {
            self.validation_failed = true;
            return Ok(ConfirmOutcome::Invalid {
                message: SUBJECTS_REQUIRED_MESSAGE,
                missing,
            });
        }

        self.validation_failed = false;
        self.ctx.data.set_training_subjects(&self.selection)?;
        self.ctx.publish(
            Stage::SubjectSelection,
            bus::SUBJECTS_CONFIRMED,
            serde_json::json!({ "subjects": self.selection }),
        );
        self.ctx.navigate(Stage::DurationSelection);

        Ok(ConfirmOutcome::Advanced {
            next: Stage::DurationSelection,
        })
    }

    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    pub fn selection(&self) -> &SubjectSelectionMap {
        &self.selection
    }

    /// Subjects offered for `program`, empty when unknown or degraded.
    pub fn available(&self, program: ProgramId) -> &[Subject] {
        self.available
            .get(&program)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up an offered subject by id.
    pub fn find_subject(&self, program: ProgramId, subject: SubjectId) -> Option<&Subject> {
        self.available(program).iter().find(|s| s.id == subject)
    }

    /// Programs whose subject listing failed.
    pub fn degraded(&self) -> &[ProgramId] {
        &self.degraded
    }

    pub fn validation_failed(&self) -> bool {
        self.validation_failed
    }

    pub fn view(&self) -> SubjectStageView {
        let programs = self
            .programs
            .iter()
            .map(|program| {
                let limit = program.subject_limit();
                let selected_count = self.selection.selected(program.id).len();
                let subjects = self
                    .available(program.id)
                    .iter()
                    .map(|subject| {
                        let selected = self.selection.is_selected(program.id, subject.id);
                        SubjectOption {
                            id: subject.id,
                            name: subject.name.clone(),
                            selected,
                            disabled: !selected && selected_count >= limit,
                        }
                    })
                    .collect();

                ProgramSubjectsView {
                    id: program.id,
                    title: program.title.clone(),
                    limit,
                    selected_count,
                    subjects,
                }
            })
            .collect();

        SubjectStageView {
            stage: Stage::SubjectSelection,
            department: self.department.clone(),
            programs,
            degraded: self.degraded.clone(),
            validation_message: self
                .validation_failed
                .then_some(SUBJECTS_REQUIRED_MESSAGE),
        }
    }

    fn program_ids(&self) -> Vec<ProgramId> {
        self.programs.iter().map(|p| p.id).collect()
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SubjectStageView {
    pub stage: Stage,
    pub department: String,
    pub programs: Vec<ProgramSubjectsView>,
    pub degraded: Vec<ProgramId>,
    pub validation_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramSubjectsView {
    pub id: ProgramId,
    pub title: String,
    pub limit: usize,
    pub selected_count: usize,
    pub subjects: Vec<SubjectOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectOption {
    pub id: SubjectId,
    pub name: String,
    pub selected: bool,
    /// Unselected and the program is at its limit.
    pub disabled: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tc_catalog::InMemoryCatalog;
    use tc_session::StudentProfile;

    use super::*;
    use crate::context::test_helpers::context;

    fn subjects(n: i64) -> Vec<Subject> {
        (1..=n).map(|i| Subject::new(i, format!("Subject {i}"))).collect()
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_course(Program::new(1, "JAMB"))
            .with_course(Program::new(2, "WAEC"))
            .with_subjects(1, "science", subjects(6))
            .with_subjects(2, "science", subjects(12))
    }

    fn seed(ctx: &StageContext, programs: &[ProgramId]) {
        ctx.data.set_selected_training(programs).unwrap();
        ctx.data
            .set_student_profile(&StudentProfile::new("science"))
            .unwrap();
    }

    async fn ready_stage(programs: &[ProgramId]) -> SubjectSelectionStage {
        let (ctx, _) = context();
        seed(&ctx, programs);
        match SubjectSelectionStage::enter(ctx, &catalog()).await.unwrap() {
            StageEntry::Ready(stage) => stage,
            StageEntry::Redirect(to) => panic!("unexpected redirect to {to:?}"),
        }
    }

    #[tokio::test]
    async fn missing_department_redirects_without_catalog_calls() {
        let (ctx, nav) = context();
        ctx.data.set_selected_training(&[1]).unwrap();
        let catalog = catalog();

        let entry = SubjectSelectionStage::enter(ctx, &catalog).await.unwrap();

        assert_eq!(entry.redirect_target(), Some(Stage::ProgramSelection));
        assert_eq!(nav.history(), vec![Stage::ProgramSelection]);
        assert_eq!(catalog.call_count(), 0);
    }

    #[tokio::test]
    async fn loads_titles_and_subjects_in_selection_order() {
        let stage = ready_stage(&[2, 1]).await;

        let titles: Vec<&str> = stage.programs().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["WAEC", "JAMB"]);
        assert_eq!(stage.available(1).len(), 6);
        assert_eq!(stage.available(2).len(), 12);
        assert_eq!(stage.selection().len(), 2);
        assert!(stage.degraded().is_empty());
    }

    #[tokio::test]
    async fn jamb_program_stops_at_four() {
        let mut stage = ready_stage(&[1]).await;
        for subject in subjects(4) {
            assert_eq!(stage.toggle_subject(1, subject), ToggleOutcome::Added);
        }

        assert_eq!(
            stage.toggle_subject(1, Subject::new(5, "Subject 5")),
            ToggleOutcome::LimitReached
        );
        assert_eq!(stage.selection().selected(1).len(), 4);

        // Removing one frees a slot again.
        assert_eq!(
            stage.toggle_subject(1, Subject::new(2, "Subject 2")),
            ToggleOutcome::Removed
        );
        assert_eq!(
            stage.toggle_subject(1, Subject::new(5, "Subject 5")),
            ToggleOutcome::Added
        );
    }

    #[tokio::test]
    async fn other_programs_allow_nine() {
        let mut stage = ready_stage(&[2]).await;
        for subject in subjects(9) {
            stage.toggle_subject(2, subject);
        }
        assert_eq!(
            stage.toggle_subject(2, Subject::new(10, "Subject 10")),
            ToggleOutcome::LimitReached
        );
    }

    #[tokio::test]
    async fn toggling_an_unselected_program_is_ignored() {
        let mut stage = ready_stage(&[1]).await;
        assert_eq!(
            stage.toggle_subject(9, Subject::new(1, "Subject 1")),
            ToggleOutcome::UnknownProgram
        );
    }

    #[tokio::test]
    async fn confirm_with_empty_program_fails_without_writing() {
        let (ctx, nav) = context();
        seed(&ctx, &[1]);
        let data = ctx.data.clone();
        let StageEntry::Ready(mut stage) = SubjectSelectionStage::enter(ctx, &catalog())
            .await
            .unwrap()
        else {
            panic!("expected ready");
        };

        let outcome = stage.confirm_and_advance().unwrap();

        assert_matches!(
            outcome,
            ConfirmOutcome::Invalid { message, ref missing }
                if message == SUBJECTS_REQUIRED_MESSAGE && missing == &vec![1]
        );
        assert!(stage.validation_failed());
        assert_eq!(stage.view().validation_message, Some(SUBJECTS_REQUIRED_MESSAGE));
        assert_eq!(data.training_subjects().unwrap(), None);
        assert!(nav.history().is_empty());
    }

    #[tokio::test]
    async fn confirm_writes_selection_and_advances() {
        let (ctx, nav) = context();
        seed(&ctx, &[1]);
        let data = ctx.data.clone();
        let StageEntry::Ready(mut stage) = SubjectSelectionStage::enter(ctx, &catalog())
            .await
            .unwrap()
        else {
            panic!("expected ready");
        };

        stage.toggle_subject(1, Subject::new(1, "Subject 1"));
        stage.toggle_subject(1, Subject::new(3, "Subject 3"));
        assert_eq!(
            stage.confirm_and_advance().unwrap(),
            ConfirmOutcome::Advanced {
                next: Stage::DurationSelection
            }
        );

        let stored = data.training_subjects().unwrap().unwrap();
        assert_eq!(stored.selected(1).len(), 2);
        assert_eq!(nav.last(), Some(Stage::DurationSelection));
        assert!(!stage.validation_failed());
    }

    #[tokio::test]
    async fn failed_listing_degrades_only_that_program() {
        let (ctx, _) = context();
        seed(&ctx, &[1, 2]);
        let catalog = catalog().failing_program(1);

        let StageEntry::Ready(stage) = SubjectSelectionStage::enter(ctx, &catalog).await.unwrap()
        else {
            panic!("expected ready");
        };

        assert!(stage.available(1).is_empty());
        assert_eq!(stage.available(2).len(), 12);
        assert_eq!(stage.degraded(), &[1]);
    }

    #[tokio::test]
    async fn failed_course_listing_offers_no_subjects() {
        let (ctx, _) = context();
        seed(&ctx, &[1]);
        let catalog = catalog().failing_courses();

        let StageEntry::Ready(mut stage) = SubjectSelectionStage::enter(ctx, &catalog)
            .await
            .unwrap()
        else {
            panic!("expected ready");
        };

        assert_eq!(stage.programs()[0].title, "Course 1");
        assert!(stage.available(1).is_empty());
        assert_eq!(stage.degraded(), &[1]);
        // Only the course listing was requested.
        assert_eq!(catalog.call_count(), 1);
        assert_matches!(
            stage.confirm_and_advance().unwrap(),
            ConfirmOutcome::Invalid { ref missing, .. } if missing == &vec![1]
        );
    }

    #[tokio::test]
    async fn unlisted_program_is_degraded_without_subject_call() {
        let (ctx, _) = context();
        seed(&ctx, &[7, 2]);
        let catalog = catalog().with_subjects(7, "science", subjects(3));

        let StageEntry::Ready(stage) = SubjectSelectionStage::enter(ctx, &catalog).await.unwrap()
        else {
            panic!("expected ready");
        };

        assert_eq!(stage.programs()[0].title, "Course 7");
        assert!(stage.available(7).is_empty());
        assert_eq!(stage.available(2).len(), 12);
        assert_eq!(stage.degraded(), &[7]);
        assert_eq!(catalog.call_count(), 2);
    }

    #[tokio::test]
    async fn view_disables_unselected_subjects_at_limit() {
        let mut stage = ready_stage(&[1]).await;
        for subject in subjects(4) {
            stage.toggle_subject(1, subject);
        }

        let view = stage.view();
        let program = &view.programs[0];
        assert_eq!(program.limit, 4);
        assert_eq!(program.selected_count, 4);

        let fifth = program.subjects.iter().find(|s| s.id == 5).unwrap();
        assert!(!fifth.selected);
        assert!(fifth.disabled);
        let first = program.subjects.iter().find(|s| s.id == 1).unwrap();
        assert!(first.selected);
        assert!(!first.disabled);
    }

    #[tokio::test]
    async fn teardown_blocks_confirm() {
        let mut stage = ready_stage(&[1]).await;
        stage.toggle_subject(1, Subject::new(1, "Subject 1"));
        stage.context().teardown();

        assert_eq!(stage.confirm_and_advance().unwrap(), ConfirmOutcome::TornDown);
        assert_eq!(stage.context().data.training_subjects().unwrap(), None);
    }
}
