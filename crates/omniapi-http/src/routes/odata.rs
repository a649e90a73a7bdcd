//! OData endpoints: service document, entity sets and entities by key.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use omniapi_service::error::ServiceError;
use omniapi_service::odata::{self, ODataQuery};
use omniapi_service::types::EntityKind;
use serde_json::{Value, json};

use crate::error::status_for;
use crate::state::AppState;

/// OData-shaped error: `{"error": {"code", "message"}}`.
pub struct ODataError(ServiceError);

impl From<ServiceError> for ODataError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ODataError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(msg) = &self.0 {
            tracing::error!(%msg, "internal server error");
        }
        let body = json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
            }
        });
        (status_for(&self.0), Json(body)).into_response()
    }
}

/// Lists the entity sets.
pub async fn service_document() -> Json<Value> {
    let sets: Vec<Value> = EntityKind::ALL
        .iter()
        .map(|kind| json!({ "name": kind.plural(), "kind": "EntitySet", "url": kind.plural() }))
        .collect();
    Json(json!({ "@odata.context": "$metadata", "value": sets }))
}

/// `GET /odata/{Set}` with `$filter`/`$orderby`/`$top`, or `GET /odata/{Set}(key)`.
pub async fn get_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ODataError> {
    let (kind, key) = odata::parse_resource(&resource)?;
    if let Some(key) = key {
        return Ok(Json(state.store().get(kind, &key)?));
    }
    let query = ODataQuery::from_params(&params, state.odata_strict())?;
    Ok(Json(odata::query_collection(state.store(), kind, &query)?))
}

/// `POST /odata/{Set}`: creates an entity from its JSON representation.
pub async fn create_entity(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ODataError> {
    let (kind, key) = odata::parse_resource(&resource)?;
    if key.is_some() {
        return Err(ServiceError::bad_request("cannot POST to an entity key").into());
    }
    let record = state.store().create(kind, object_body(&body)?)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `PATCH /odata/{Set}(key)`: merges the body into the entity.
pub async fn patch_entity(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ODataError> {
    let (kind, key) = odata::parse_resource(&resource)?;
    let key = require_key(key)?;
    Ok(Json(state.store().update(kind, &key, object_body(&body)?)?))
}

/// `DELETE /odata/{Set}(key)`.
pub async fn delete_entity(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<StatusCode, ODataError> {
    let (kind, key) = odata::parse_resource(&resource)?;
    state.store().delete(kind, &require_key(key)?)?;
    Ok(StatusCode::NO_CONTENT)
}

fn require_key(key: Option<String>) -> Result<String, ServiceError> {
    key.ok_or_else(|| ServiceError::bad_request("an entity key is required, e.g. Movies('1')"))
}

fn object_body(body: &[u8]) -> Result<serde_json::Map<String, Value>, ServiceError> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ServiceError::bad_request("entity body must be a JSON object")),
        Err(e) => Err(ServiceError::bad_request(format!("invalid JSON body: {e}"))),
    }
}
