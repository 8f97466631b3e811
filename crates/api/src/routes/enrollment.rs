//! Route definitions for enrollment wizard sessions.
//!
//! Mounted at `/enrollments` by `api_routes()`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::enrollment;
use crate::state::AppState;

/// Enrollment session routes, mounted at `/enrollments`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(enrollment::create_session))
        .route(
            "/{id}",
            get(enrollment::get_session).delete(enrollment::delete_session),
        )
        .route(
            "/{id}/program-selection",
            put(enrollment::set_program_selection),
        )
        .route("/{id}/profile", put(enrollment::set_profile))
        .route("/{id}/back", post(enrollment::go_back))
        // Subject selection.
        .route("/{id}/subjects", post(enrollment::enter_subjects))
        .route("/{id}/subjects/toggle", post(enrollment::toggle_subject))
        .route("/{id}/subjects/confirm", post(enrollment::confirm_subjects))
        // Duration selection.
        .route("/{id}/duration", post(enrollment::enter_duration))
        .route("/{id}/duration/select", post(enrollment::select_duration))
        .route("/{id}/duration/confirm", post(enrollment::confirm_durations))
        // Payment.
        .route("/{id}/payment", post(enrollment::enter_payment))
        .route("/{id}/payment/gateway", post(enrollment::select_gateway))
        .route("/{id}/payment/request", get(enrollment::payment_request))
        .route("/{id}/payment/success", post(enrollment::payment_success))
        .route("/{id}/payment/close", post(enrollment::payment_close))
}
