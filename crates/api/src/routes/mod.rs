pub mod enrollment;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /enrollments                                      create (POST)
/// /enrollments/{id}                                 get, delete
/// /enrollments/{id}/program-selection               write selected programs (PUT)
/// /enrollments/{id}/profile                         write student profile (PUT)
/// /enrollments/{id}/back                            back navigation (POST)
///
/// /enrollments/{id}/subjects                        enter subject stage (POST)
/// /enrollments/{id}/subjects/toggle                 toggle subject (POST)
/// /enrollments/{id}/subjects/confirm                confirm subjects (POST)
///
/// /enrollments/{id}/duration                        enter duration stage (POST)
/// /enrollments/{id}/duration/select                 select duration (POST)
/// /enrollments/{id}/duration/confirm                confirm durations (POST)
///
/// /enrollments/{id}/payment                         enter payment stage (POST)
/// /enrollments/{id}/payment/gateway                 select gateway (POST)
/// /enrollments/{id}/payment/request                 gateway payload (GET)
/// /enrollments/{id}/payment/success                 gateway success callback (POST)
/// /enrollments/{id}/payment/close                   gateway closed (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/enrollments", enrollment::router())
}
