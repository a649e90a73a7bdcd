//! JSON-RPC endpoint and OpenRPC document.

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde_json::Value;

use crate::state::AppState;

const OPENRPC: &str = include_str!("../../static/openrpc.json");

/// Dispatches a single call or a batch. Always 200.
pub async fn call(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    Json(state.jsonrpc().handle(state.store(), &body))
}

/// Serves the OpenRPC method description.
pub async fn openrpc() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], OPENRPC)
}
