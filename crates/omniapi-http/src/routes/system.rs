//! System and health endpoints.

use std::collections::BTreeMap;

use axum::extract::{Json, State};
use omniapi_service::types::EntityKind;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Record count per resource (`pets`, `cars`, ...).
    pub records: BTreeMap<String, usize>,
}

/// Check server health.
///
/// Returns server status, version, uptime and the size of each collection.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse),
    ),
    tag = "System"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let records = EntityKind::ALL
        .into_iter()
        .map(|kind| (kind.path_segment().to_owned(), state.store().count(kind)))
        .collect();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        records,
    })
}
