//! Request correlation: every request and response carries `X-Request-Id`,
//! and handler logs run inside a span naming the protocol being served.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use omniapi_service::auth::Protocol;
use tracing::Instrument;
use uuid::Uuid;

use super::auth::classify;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

/// Keeps a client-supplied ID when it is short printable ASCII, otherwise
/// mints a UUID v4.
fn resolve_request_id(incoming: Option<&HeaderValue>) -> String {
    incoming
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .filter(|v| v.bytes().all(|b| b.is_ascii_graphic()))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

fn protocol_label(protocol: Option<Protocol>) -> &'static str {
    match protocol {
        Some(Protocol::OpenApi) => "openapi",
        Some(Protocol::Swagger) => "swagger",
        Some(Protocol::GraphQl) => "graphql",
        Some(Protocol::OData) => "odata",
        Some(Protocol::Soap) => "soap",
        Some(Protocol::JsonRpc) => "jsonrpc",
        None => "system",
    }
}

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = resolve_request_id(req.headers().get(&X_REQUEST_ID));
    let protocol = protocol_label(classify(req.method(), req.uri().path()));

    let header = HeaderValue::from_str(&request_id).ok();
    if let Some(val) = &header {
        req.headers_mut().insert(X_REQUEST_ID.clone(), val.clone());
    }

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        protocol,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;

    if let Some(val) = header {
        response.headers_mut().insert(X_REQUEST_ID.clone(), val);
    }
    response
}
