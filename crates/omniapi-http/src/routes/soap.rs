//! SOAP endpoint and WSDL document.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use omniapi_service::error::ServiceError;
use omniapi_service::soap;

use crate::state::AppState;

const WSDL: &str = include_str!("../../static/service.wsdl");
const XML: &str = "text/xml; charset=utf-8";

/// Handles a SOAP call. Faults are in-band, so the status is always 200.
pub async fn call(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let xml = match (content_type, std::str::from_utf8(&body)) {
        (Some(ct), _) if !soap::is_xml_content_type(ct) => soap::encode_fault(
            &ServiceError::bad_request(format!("unsupported content type '{ct}', expected XML")),
        ),
        (_, Err(_)) => soap::encode_fault(&ServiceError::bad_request("request body is not UTF-8")),
        (_, Ok(text)) => soap::handle(state.store(), text),
    };

    ([(header::CONTENT_TYPE, XML)], xml)
}

/// Serves the WSDL service description.
pub async fn wsdl() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, XML)], WSDL)
}
