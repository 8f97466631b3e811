#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tc_api::config::ServerConfig;
use tc_api::router::build_app_router;
use tc_api::state::AppState;
use tc_catalog::{CatalogConfig, InMemoryCatalog};
use tc_core::program::{Program, Subject};
use tc_enrollment::EnrollmentConfig;
use tc_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        catalog: CatalogConfig::default(),
        enrollment: EnrollmentConfig::default(),
    }
}

/// Catalog with one JAMB program offering four science subjects.
pub fn test_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_course(Program::new(1, "JAMB"))
        .with_course(Program::new(2, "WAEC"))
        .with_subjects(
            1,
            "science",
            vec![
                Subject::new(11, "Mathematics"),
                Subject::new(12, "Physics"),
                Subject::new(13, "Chemistry"),
                Subject::new(14, "Biology"),
            ],
        )
}

/// Build the full application router over `catalog`.
///
/// Uses the same middleware stack as the binary.
pub fn build_test_app_with(catalog: InMemoryCatalog) -> Router {
    let config = test_config();
    let state = AppState::new(
        config.clone(),
        Arc::new(catalog),
        Arc::new(EventBus::default()),
    );
    build_app_router(state, &config)
}

pub fn build_test_app() -> Router {
    build_test_app_with(test_catalog())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a session and return its base URI, `/api/v1/enrollments/{id}`.
pub async fn create_session(app: &Router) -> String {
    let response = post(app, "/api/v1/enrollments").await;
    let json = body_json(response).await;
    format!("/api/v1/enrollments/{}", json["data"]["id"].as_str().unwrap())
}

/// Create a session with programs and a department already stored.
pub async fn seeded_session(app: &Router, programs: &[i64], department: &str) -> String {
    let base = create_session(app).await;
    put_json(
        app,
        &format!("{base}/program-selection"),
        serde_json::json!({ "programs": programs }),
    )
    .await;
    put_json(
        app,
        &format!("{base}/profile"),
        serde_json::json!({ "department": department, "phone": "0800" }),
    )
    .await;
    base
}
