//! Resource-style CRUD endpoints.
//!
//! The same handlers serve `/openapi/{kind}` (open) and `/swagger/{kind}`
//! (bearer token, enforced by the auth middleware). Bodies use the
//! compact-name convention: `{"name": "Buddy (Beagle)"}`.

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use omniapi_service::error::ServiceError;
use omniapi_service::rest::{body_to_fields, parse_limit};
use omniapi_service::store::apply_limit;
use omniapi_service::types::EntityKind;
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    /// Maximum number of records to return.
    limit: Option<String>,
}

fn kind_from_path(segment: &str) -> Result<EntityKind, ApiError> {
    EntityKind::from_path_segment(segment)
        .ok_or_else(|| ServiceError::not_found(format!("unknown resource '{segment}'")).into())
}

fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ServiceError::bad_request(format!("invalid JSON body: {e}")).into())
}

/// List records of a kind.
#[utoipa::path(
    get,
    path = "/{kind}",
    params(
        ("kind" = String, Path, description = "Resource: pets, dinosaurs, cars, movies or plants"),
        ListParams,
    ),
    responses(
        (status = 200, description = "Records in insertion order", body = Vec<Object>),
        (status = 400, description = "Invalid limit", body = ErrorBody),
        (status = 404, description = "Unknown resource", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn list_records(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let kind = kind_from_path(&kind)?;
    let limit = parse_limit(params.limit.as_deref())?;
    let records = state.store().list(kind)?;
    Ok(Json(apply_limit(records, limit)))
}

/// Create a record.
///
/// A `name` of the form `"Primary (Secondary)"` fills the kind's name and
/// secondary attribute (breed, species, make, genre).
#[utoipa::path(
    post,
    path = "/{kind}",
    params(("kind" = String, Path, description = "Resource name")),
    request_body = Object,
    responses(
        (status = 201, description = "Record created", body = Object),
        (status = 400, description = "Invalid body", body = ErrorBody),
        (status = 404, description = "Unknown resource", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn create_record(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind = kind_from_path(&kind)?;
    let fields = body_to_fields(kind, parse_body(&body)?)?;
    let record = state.store().create(kind, fields)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Fetch a record by id.
#[utoipa::path(
    get,
    path = "/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Resource name"),
        ("id" = String, Path, description = "Record identifier"),
    ),
    responses(
        (status = 200, description = "The record", body = Object),
        (status = 404, description = "Record or resource not found", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let kind = kind_from_path(&kind)?;
    Ok(Json(state.store().get(kind, &id)?))
}

/// Update a record, merging the given fields.
#[utoipa::path(
    put,
    path = "/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Resource name"),
        ("id" = String, Path, description = "Record identifier"),
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Updated record", body = Object),
        (status = 400, description = "Invalid body", body = ErrorBody),
        (status = 404, description = "Record or resource not found", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let kind = kind_from_path(&kind)?;
    let fields = body_to_fields(kind, parse_body(&body)?)?;
    Ok(Json(state.store().update(kind, &id, fields)?))
}

/// Delete a record.
#[utoipa::path(
    delete,
    path = "/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Resource name"),
        ("id" = String, Path, description = "Record identifier"),
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record or resource not found", body = ErrorBody),
    ),
    tag = "Records"
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = kind_from_path(&kind)?;
    state.store().delete(kind, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
