//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Use [`DataResponse`]
//! instead of ad-hoc `serde_json::json!({ "data": ... })`.

use serde::Serialize;
use tc_core::stage::Stage;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Where the client must route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub stage: Stage,
    pub path: &'static str,
}

impl From<Stage> for Navigation {
    fn from(stage: Stage) -> Self {
        Self {
            stage,
            path: stage.path(),
        }
    }
}
