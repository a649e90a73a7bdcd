//! REST error responses.
//!
//! `ServiceError` is transport-agnostic; `ApiError` gives it the plain
//! JSON shape used by the resource-style (OpenAPI / Swagger) routes.
//! Other protocols encode errors through their own adapters.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use omniapi_service::error::ServiceError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Error code (e.g. "bad_request", "not_found", "unauthorized").
    pub(crate) error: String,
    /// Human-readable error detail, if available.
    pub(crate) detail: Option<String>,
}

/// REST error: a `ServiceError` rendered as status + [`ErrorBody`].
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ServiceError);

/// HTTP status for each error class, shared by every JSON-based protocol.
pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) | ServiceError::MethodNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
        ServiceError::Domain(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let detail = match &self.0 {
            ServiceError::Unauthorized => None,
            ServiceError::Internal(msg) => {
                tracing::error!(%msg, "internal server error");
                Some(msg.clone())
            }
            other => Some(other.to_string()),
        };

        let body = ErrorBody {
            error: self.0.code().to_string(),
            detail,
        };

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}
