use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tc_core::error::CoreError;
use tc_enrollment::FlowError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`FlowError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `tc_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error raised while driving the wizard.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// A resource addressed by a non-numeric key does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Flow(flow) => match flow {
                FlowError::Core(core) => classify_core_error(core),
                FlowError::StageNotActive { .. } => {
                    (StatusCode::CONFLICT, "STAGE_NOT_ACTIVE", flow.to_string())
                }
                FlowError::Store(err) => {
                    tracing::error!(error = %err, "Session store error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a [`CoreError`] into an HTTP status, error code, and message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_TRANSITION", err.to_string())
        }
    }
}
