//! GraphQL endpoint and schema document.

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use omniapi_service::error::ServiceError;
use omniapi_service::graphql::{self, GraphQlRequest};

use crate::state::AppState;

const SCHEMA_SDL: &str = include_str!("../../static/schema.graphql");

/// Executes a GraphQL request. Field errors travel in the envelope with 200.
pub async fn execute(State(state): State<AppState>, body: Bytes) -> Response {
    let request: GraphQlRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            let error = ServiceError::bad_request(format!("invalid GraphQL request body: {e}"));
            return (StatusCode::BAD_REQUEST, Json(graphql::error_response(&error))).into_response();
        }
    };
    Json(state.graphql().execute(state.store(), &request)).into_response()
}

/// Serves the schema in SDL form.
pub async fn schema() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], SCHEMA_SDL)
}
