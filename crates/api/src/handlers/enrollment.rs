//! Handlers for enrollment wizard sessions.
//!
//! Every handler locks the addressed session for the whole request, so
//! operations on one session never interleave. Responses report where the
//! client must navigate next, taken from the session's navigator.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use tc_core::billing::BillingDuration;
use tc_core::payment::{GatewayResponse, PaymentGateway};
use tc_core::phase::EnrollmentPhase;
use tc_core::selection::ToggleOutcome;
use tc_core::stage::Stage;
use tc_core::types::{ProgramId, SubjectId, Timestamp};
use tc_enrollment::{
    ConfirmOutcome, EnrollmentSession, FlowError, StageEntry, StageView, SuccessOutcome,
};
use tc_session::StudentProfile;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, Navigation};
use crate::sessions::SessionHandle;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ProgramSelectionBody {
    pub programs: Vec<ProgramId>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSubjectBody {
    pub program_id: ProgramId,
    pub subject_id: SubjectId,
}

#[derive(Debug, Deserialize)]
pub struct SelectDurationBody {
    pub program_id: ProgramId,
    /// `"monthly"` or `"annually"`.
    pub duration: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectGatewayBody {
    /// Gateway display name, e.g. `"Paystack"`.
    pub gateway: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub phase: EnrollmentPhase,
    pub current: Navigation,
    pub active_stage: Option<Stage>,
    pub last_navigation: Option<Navigation>,
    pub view: Option<StageView>,
    pub created_at: Timestamp,
}

/// Result of entering a stage.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryResult {
    Ready { view: StageView },
    Redirect { navigation: Navigation },
}

impl From<StageEntry<StageView>> for EntryResult {
    fn from(entry: StageEntry<StageView>) -> Self {
        match entry {
            StageEntry::Ready(view) => Self::Ready { view },
            StageEntry::Redirect(to) => Self::Redirect {
                navigation: to.into(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResult {
    pub outcome: ToggleOutcome,
    pub view: Option<StageView>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResult {
    #[serde(flatten)]
    pub outcome: ConfirmOutcome,
    pub navigation: Option<Navigation>,
    pub view: Option<StageView>,
}

#[derive(Debug, Serialize)]
pub struct SelectDurationResult {
    pub accepted: bool,
    pub view: Option<StageView>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResult {
    pub outcome: SuccessOutcome,
    pub navigation: Option<Navigation>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Look up a live session or fail with 404.
async fn find_session(state: &AppState, id: Uuid) -> AppResult<Arc<SessionHandle>> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Enrollment session {id} not found")))
}

fn summarize(handle: &SessionHandle, session: &EnrollmentSession) -> SessionSummary {
    SessionSummary {
        id: handle.id,
        phase: session.phase(),
        current: session.current_stage().into(),
        active_stage: session.active_stage(),
        last_navigation: handle.navigator.last().map(Navigation::from),
        view: session.view(),
        created_at: handle.created_at,
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// POST /enrollments
pub async fn create_session(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let handle = state.sessions.create(state.session_deps()).await;
    let session = handle.session.lock().await;
    let summary = summarize(&handle, &session);

    Ok((StatusCode::CREATED, Json(DataResponse { data: summary })))
}

/// GET /enrollments/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<SessionSummary>>> {
    let handle = find_session(&state, id).await?;
    let session = handle.session.lock().await;
    Ok(Json(DataResponse {
        data: summarize(&handle, &session),
    }))
}

/// DELETE /enrollments/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Enrollment session {id} not found")))?;
    tracing::info!(session_id = %id, "Enrollment session deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Upstream data (written by other parts of the signup flow)
// ---------------------------------------------------------------------------

/// PUT /enrollments/{id}/program-selection
pub async fn set_program_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProgramSelectionBody>,
) -> AppResult<Json<DataResponse<SessionSummary>>> {
    let handle = find_session(&state, id).await?;
    let session = handle.session.lock().await;
    session
        .data()
        .set_selected_training(&body.programs)
        .map_err(FlowError::from)?;

    tracing::debug!(session_id = %id, programs = ?body.programs, "Program selection stored");
    Ok(Json(DataResponse {
        data: summarize(&handle, &session),
    }))
}

/// PUT /enrollments/{id}/profile
pub async fn set_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(profile): Json<StudentProfile>,
) -> AppResult<Json<DataResponse<SessionSummary>>> {
    let handle = find_session(&state, id).await?;
    let session = handle.session.lock().await;
    session
        .data()
        .set_student_profile(&profile)
        .map_err(FlowError::from)?;

    tracing::debug!(session_id = %id, department = %profile.department, "Student profile stored");
    Ok(Json(DataResponse {
        data: summarize(&handle, &session),
    }))
}

/// POST /enrollments/{id}/back
pub async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<Navigation>>> {
    let handle = find_session(&state, id).await?;
    let to = handle.session.lock().await.back()?;
    Ok(Json(DataResponse { data: to.into() }))
}

// ---------------------------------------------------------------------------
// Subject selection
// ---------------------------------------------------------------------------

/// POST /enrollments/{id}/subjects
pub async fn enter_subjects(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<EntryResult>>> {
    let handle = find_session(&state, id).await?;
    let entry = handle.session.lock().await.enter_subjects().await?;
    Ok(Json(DataResponse { data: entry.into() }))
}

/// POST /enrollments/{id}/subjects/toggle
pub async fn toggle_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ToggleSubjectBody>,
) -> AppResult<Json<DataResponse<ToggleResult>>> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    let outcome = session.toggle_subject(body.program_id, body.subject_id)?;
    Ok(Json(DataResponse {
        data: ToggleResult {
            outcome,
            view: session.view(),
        },
    }))
}

/// POST /enrollments/{id}/subjects/confirm
pub async fn confirm_subjects(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<ConfirmResult>>> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    let outcome = session.confirm_subjects()?;
    Ok(Json(DataResponse {
        data: confirm_result(outcome, &session),
    }))
}

fn confirm_result(outcome: ConfirmOutcome, session: &EnrollmentSession) -> ConfirmResult {
    let navigation = match &outcome {
        ConfirmOutcome::Advanced { next } => Some(Navigation::from(*next)),
        _ => None,
    };
    ConfirmResult {
        outcome,
        navigation,
        view: session.view(),
    }
}

// ---------------------------------------------------------------------------
// Duration selection
// ---------------------------------------------------------------------------

/// POST /enrollments/{id}/duration
pub async fn enter_duration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<EntryResult>>> {
    let handle = find_session(&state, id).await?;
    let entry = handle.session.lock().await.enter_duration().await?;
    Ok(Json(DataResponse { data: entry.into() }))
}

/// POST /enrollments/{id}/duration/select
pub async fn select_duration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SelectDurationBody>,
) -> AppResult<Json<DataResponse<SelectDurationResult>>> {
    let duration = BillingDuration::from_str_value(&body.duration)?;
    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    let accepted = session.select_duration(body.program_id, duration)?;
    Ok(Json(DataResponse {
        data: SelectDurationResult {
            accepted,
            view: session.view(),
        },
    }))
}

/// POST /enrollments/{id}/duration/confirm
pub async fn confirm_durations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<ConfirmResult>>> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    let outcome = session.confirm_durations()?;
    Ok(Json(DataResponse {
        data: confirm_result(outcome, &session),
    }))
}

// ---------------------------------------------------------------------------
// Payment
// ---------------------------------------------------------------------------

/// POST /enrollments/{id}/payment
pub async fn enter_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<EntryResult>>> {
    let handle = find_session(&state, id).await?;
    let entry = handle.session.lock().await.enter_payment()?;
    Ok(Json(DataResponse { data: entry.into() }))
}

/// POST /enrollments/{id}/payment/gateway
pub async fn select_gateway(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SelectGatewayBody>,
) -> AppResult<Json<DataResponse<Option<StageView>>>> {
    let gateway = PaymentGateway::from_name(&body.gateway)?;
    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    session.select_gateway(gateway)?;
    Ok(Json(DataResponse {
        data: session.view(),
    }))
}

/// GET /enrollments/{id}/payment/request
pub async fn payment_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let handle = find_session(&state, id).await?;
    let request = handle.session.lock().await.payment_request(Utc::now())?;
    Ok(Json(DataResponse { data: request }))
}

/// POST /enrollments/{id}/payment/success
///
/// Called with whatever the gateway widget reported. Not a verified charge.
pub async fn payment_success(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(response): Json<GatewayResponse>,
) -> AppResult<Json<DataResponse<SuccessResult>>> {
    let handle = find_session(&state, id).await?;
    let outcome = handle.session.lock().await.gateway_success(&response)?;
    let navigation: Option<Navigation> =
        (outcome == SuccessOutcome::Navigated).then(|| Stage::Dashboard.into());
    Ok(Json(DataResponse {
        data: SuccessResult {
            outcome,
            navigation,
        },
    }))
}

/// POST /enrollments/{id}/payment/close
pub async fn payment_close(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<Option<StageView>>>> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.session.lock().await;
    session.gateway_close()?;
    Ok(Json(DataResponse {
        data: session.view(),
    }))
}
