//! One student's pass through the wizard.
//!
//! [`EnrollmentSession`] keeps at most one stage alive. Entering a stage,
//! confirming one, going back, or closing the session tears the previous
//! stage down first, so responses it was still waiting on are dropped.

use std::sync::Arc;

use serde::Serialize;
use tc_catalog::CatalogApi;
use tc_core::billing::BillingDuration;
use tc_core::error::CoreError;
use tc_core::payment::{GatewayResponse, PaymentGateway, PaymentRequest};
use tc_core::phase::{validate_phase_transition, EnrollmentPhase};
use tc_core::selection::ToggleOutcome;
use tc_core::stage::Stage;
use tc_core::types::{ProgramId, SubjectId, Timestamp};
use tc_events::EventBus;
use tc_session::SessionData;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EnrollmentConfig;
use crate::context::StageContext;
use crate::duration::{DurationSelectionStage, DurationStageView};
use crate::entry::{ConfirmOutcome, StageEntry};
use crate::error::FlowError;
use crate::navigator::Navigator;
use crate::payment::{PaymentStage, PaymentStageView, SuccessOutcome};
use crate::subject::{SubjectSelectionStage, SubjectStageView};

/// Collaborators shared by every stage of a session.
#[derive(Clone)]
pub struct SessionDeps {
    pub catalog: Arc<dyn CatalogApi>,
    pub navigator: Arc<dyn Navigator>,
    pub events: Arc<EventBus>,
    pub config: Arc<EnrollmentConfig>,
}

/// Rendered state of whichever stage is active.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StageView {
    Subjects(SubjectStageView),
    Duration(DurationStageView),
    Payment(PaymentStageView),
}

enum ActiveStage {
    None,
    Subjects(SubjectSelectionStage),
    Duration(DurationSelectionStage),
    Payment(PaymentStage),
}

impl ActiveStage {
    fn stage(&self) -> Option<Stage> {
        match self {
            Self::None => None,
            Self::Subjects(_) => Some(Stage::SubjectSelection),
            Self::Duration(_) => Some(Stage::DurationSelection),
            Self::Payment(_) => Some(Stage::PaymentSelection),
        }
    }

    fn context(&self) -> Option<&StageContext> {
        match self {
            Self::None => None,
            Self::Subjects(s) => Some(s.context()),
            Self::Duration(s) => Some(s.context()),
            Self::Payment(s) => Some(s.context()),
        }
    }
}

pub struct EnrollmentSession {
    id: Uuid,
    data: SessionData,
    deps: SessionDeps,
    phase: EnrollmentPhase,
    active: ActiveStage,
    cancel: CancellationToken,
}

impl EnrollmentSession {
    /// A session that has just left program selection.
    pub fn new(id: Uuid, data: SessionData, deps: SessionDeps) -> Self {
        Self {
            id,
            data,
            deps,
            phase: EnrollmentPhase::ProgramSelected,
            active: ActiveStage::None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn phase(&self) -> EnrollmentPhase {
        self.phase
    }

    pub fn active_stage(&self) -> Option<Stage> {
        self.active.stage()
    }

    /// The page the student is on: the active stage, else the phase's page.
    pub fn current_stage(&self) -> Stage {
        self.active.stage().unwrap_or_else(|| self.phase.stage())
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Root token of every stage this session starts.
    ///
    /// Cancelling it tears down the active stage, including a catalog load
    /// in progress, without waiting for whoever holds the session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn view(&self) -> Option<StageView> {
        match &self.active {
            ActiveStage::None => None,
            ActiveStage::Subjects(s) => Some(StageView::Subjects(s.view())),
            ActiveStage::Duration(s) => Some(StageView::Duration(s.view())),
            ActiveStage::Payment(s) => Some(StageView::Payment(s.view())),
        }
    }

    // -----------------------------------------------------------------------
    // Subject selection
    // -----------------------------------------------------------------------

    pub async fn enter_subjects(&mut self) -> Result<StageEntry<StageView>, FlowError> {
        let ctx = self.begin_stage()?;
        let catalog = Arc::clone(&self.deps.catalog);
        match SubjectSelectionStage::enter(ctx, catalog.as_ref()).await? {
            StageEntry::Ready(stage) => {
                let view = StageView::Subjects(stage.view());
                self.activate(Stage::SubjectSelection, ActiveStage::Subjects(stage));
                Ok(StageEntry::Ready(view))
            }
            StageEntry::Redirect(to) => Ok(self.rewind(to)),
        }
    }

    /// Toggle an offered subject by id.
    pub fn toggle_subject(
        &mut self,
        program: ProgramId,
        subject: SubjectId,
    ) -> Result<ToggleOutcome, FlowError> {
        let stage = self.subjects_mut()?;
        if stage.program(program).is_none() {
            return Ok(ToggleOutcome::UnknownProgram);
        }
        let subject = stage
            .find_subject(program, subject)
            .cloned()
            .ok_or(CoreError::NotFound {
                entity: "subject",
                id: subject,
            })?;
        Ok(stage.toggle_subject(program, subject))
    }

    pub fn confirm_subjects(&mut self) -> Result<ConfirmOutcome, FlowError> {
        let phase = self.phase;
        let stage = self.subjects_mut()?;
        validate_phase_transition(phase, EnrollmentPhase::SubjectsConfirmed)?;
        let outcome = stage.confirm_and_advance()?;
        self.after_confirm(&outcome, EnrollmentPhase::SubjectsConfirmed);
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Duration selection
    // -----------------------------------------------------------------------

    pub async fn enter_duration(&mut self) -> Result<StageEntry<StageView>, FlowError> {
        let ctx = self.begin_stage()?;
        let catalog = Arc::clone(&self.deps.catalog);
        let config = Arc::clone(&self.deps.config);
        match DurationSelectionStage::enter(ctx, catalog.as_ref(), &config.pricing).await? {
            StageEntry::Ready(stage) => {
                let view = StageView::Duration(stage.view());
                self.activate(Stage::DurationSelection, ActiveStage::Duration(stage));
                Ok(StageEntry::Ready(view))
            }
            StageEntry::Redirect(to) => Ok(self.rewind(to)),
        }
    }

    pub fn select_duration(
        &mut self,
        program: ProgramId,
        duration: BillingDuration,
    ) -> Result<bool, FlowError> {
        Ok(self.duration_mut()?.select_duration(program, duration))
    }

    pub fn confirm_durations(&mut self) -> Result<ConfirmOutcome, FlowError> {
        let phase = self.phase;
        let stage = self.duration_mut()?;
        validate_phase_transition(phase, EnrollmentPhase::DurationConfirmed)?;
        let outcome = stage.confirm_and_advance()?;
        self.after_confirm(&outcome, EnrollmentPhase::DurationConfirmed);
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Payment
    // -----------------------------------------------------------------------

    pub fn enter_payment(&mut self) -> Result<StageEntry<StageView>, FlowError> {
        let ctx = self.begin_stage()?;
        let config = Arc::clone(&self.deps.config);
        match PaymentStage::enter(ctx, &config)? {
            StageEntry::Ready(stage) => {
                let view = StageView::Payment(stage.view());
                self.activate(Stage::PaymentSelection, ActiveStage::Payment(stage));
                Ok(StageEntry::Ready(view))
            }
            StageEntry::Redirect(to) => Ok(self.rewind(to)),
        }
    }

    pub fn select_gateway(&mut self, gateway: PaymentGateway) -> Result<(), FlowError> {
        Ok(self.payment_mut()?.select_gateway(gateway)?)
    }

    pub fn payment_request(&mut self, at: Timestamp) -> Result<PaymentRequest, FlowError> {
        Ok(self.payment_mut()?.payment_request(at)?)
    }

    /// Gateway success callback. Safe to call more than once.
    pub fn gateway_success(
        &mut self,
        response: &GatewayResponse,
    ) -> Result<SuccessOutcome, FlowError> {
        let outcome = self.payment_mut()?.on_gateway_success(response);
        if outcome == SuccessOutcome::Navigated {
            validate_phase_transition(self.phase, EnrollmentPhase::PaymentSucceeded)?;
            self.phase = EnrollmentPhase::PaymentSucceeded;
        }
        Ok(outcome)
    }

    pub fn gateway_close(&mut self) -> Result<(), FlowError> {
        self.payment_mut()?.on_gateway_cancel_or_close();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Go to the current page's predecessor. Stored data is untouched.
    pub fn back(&mut self) -> Result<Stage, FlowError> {
        self.ensure_open()?;
        let from = self.current_stage();
        let to = from.predecessor().ok_or_else(|| {
            CoreError::Validation(format!("There is no page before {}", from.label()))
        })?;

        self.teardown_active();
        self.phase = EnrollmentPhase::on_entering(to);
        tracing::debug!(
            session_id = %self.id,
            from = from.path(),
            to = to.path(),
            "Back navigation"
        );
        self.deps.navigator.navigate(to);
        Ok(to)
    }

    /// End the session, tearing down the active stage.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.active = ActiveStage::None;
        tracing::info!(
            session_id = %self.id,
            phase = self.phase.as_str(),
            "Enrollment session closed"
        );
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.is_closed() {
            return Err(CoreError::Conflict("Enrollment session is closed".into()));
        }
        if self.phase.is_terminal() {
            return Err(CoreError::Conflict(
                "Enrollment payment already succeeded".into(),
            ));
        }
        Ok(())
    }

    /// Tear down the active stage and hand out a context for the next one.
    fn begin_stage(&mut self) -> Result<StageContext, CoreError> {
        self.ensure_open()?;
        self.teardown_active();
        Ok(StageContext::new(
            self.id,
            self.data.clone(),
            Arc::clone(&self.deps.navigator),
            Arc::clone(&self.deps.events),
            self.cancel.child_token(),
        ))
    }

    fn teardown_active(&mut self) {
        if let Some(ctx) = self.active.context() {
            ctx.teardown();
        }
        self.active = ActiveStage::None;
    }

    fn activate(&mut self, stage: Stage, active: ActiveStage) {
        self.phase = EnrollmentPhase::on_entering(stage);
        self.active = active;
        tracing::debug!(
            session_id = %self.id,
            path = stage.path(),
            phase = self.phase.as_str(),
            "Stage active"
        );
    }

    /// A guard sent the student back to `to`; rewind the phase to match.
    fn rewind<T>(&mut self, to: Stage) -> StageEntry<T> {
        self.phase = EnrollmentPhase::on_entering(to);
        StageEntry::Redirect(to)
    }

    fn after_confirm(&mut self, outcome: &ConfirmOutcome, confirmed: EnrollmentPhase) {
        if matches!(outcome, ConfirmOutcome::Advanced { .. }) {
            self.phase = confirmed;
            self.teardown_active();
        }
    }

    fn subjects_mut(&mut self) -> Result<&mut SubjectSelectionStage, FlowError> {
        match &mut self.active {
            ActiveStage::Subjects(stage) => Ok(stage),
            _ => Err(FlowError::StageNotActive {
                expected: Stage::SubjectSelection,
            }),
        }
    }

    fn duration_mut(&mut self) -> Result<&mut DurationSelectionStage, FlowError> {
        match &mut self.active {
            ActiveStage::Duration(stage) => Ok(stage),
            _ => Err(FlowError::StageNotActive {
                expected: Stage::DurationSelection,
            }),
        }
    }

    fn payment_mut(&mut self) -> Result<&mut PaymentStage, FlowError> {
        match &mut self.active {
            ActiveStage::Payment(stage) => Ok(stage),
            _ => Err(FlowError::StageNotActive {
                expected: Stage::PaymentSelection,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
