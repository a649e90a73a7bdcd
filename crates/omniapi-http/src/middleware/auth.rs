//! Per-protocol authentication middleware.
//!
//! The request path decides which protocol (and therefore which credential
//! policy) applies. Rejections are shaped like the protocol's own errors.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use omniapi_service::auth::Protocol;
use omniapi_service::error::ServiceError;
use omniapi_service::{graphql, soap};

use crate::error::ApiError;
use crate::state::AppState;

/// Schema documents, served without credentials.
fn is_document(method: &Method, path: &str) -> bool {
    matches!(
        path,
        "/openapi/openapi.json"
            | "/swagger/swagger.json"
            | "/graphql/schema"
            | "/wdsl/wsdl"
            | "/jsonrpc/openrpc.json"
    ) || (*method == Method::GET && path == "/wdsl")
}

/// Maps a request to the protocol whose policy guards it.
///
/// `None` means the route is outside every protocol (health, docs UI).
pub fn classify(method: &Method, path: &str) -> Option<Protocol> {
    if *method == Method::OPTIONS || is_document(method, path) {
        return None;
    }
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    match first {
        "openapi" => Some(Protocol::OpenApi),
        "swagger" => Some(Protocol::Swagger),
        "graphql" => Some(Protocol::GraphQl),
        "odata" => Some(Protocol::OData),
        "wdsl" => Some(Protocol::Soap),
        "jsonrpc" => Some(Protocol::JsonRpc),
        _ => None,
    }
}

/// Rejects requests whose `Authorization` header fails the protocol policy.
pub async fn auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(protocol) = classify(req.method(), req.uri().path()) else {
        return next.run(req).await;
    };

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.auth().check(protocol, authorization) {
        Ok(()) => next.run(req).await,
        Err(e) => rejection(protocol, &e),
    }
}

fn rejection(protocol: Protocol, error: &ServiceError) -> Response {
    match protocol {
        Protocol::GraphQl => (
            StatusCode::UNAUTHORIZED,
            [(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Basic realm="graphql""#),
            )],
            Json(graphql::error_response(error)),
        )
            .into_response(),
        Protocol::Soap => (
            StatusCode::UNAUTHORIZED,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/xml; charset=utf-8")),
                (header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer")),
            ],
            soap::encode_fault(error),
        )
            .into_response(),
        _ => ApiError(error.clone()).into_response(),
    }
}
