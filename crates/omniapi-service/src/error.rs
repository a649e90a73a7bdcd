//! Service-layer error types.
//!
//! `ServiceError` is transport-agnostic. Every protocol adapter maps it to
//! its own wire shape (HTTP status + JSON body, GraphQL error entries,
//! SOAP faults, JSON-RPC error objects).

/// Error taxonomy shared by all protocol adapters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// Malformed body, query or argument.
    #[error("{0}")]
    BadRequest(String),

    /// Identifier or entity kind absent.
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Unknown GraphQL field, SOAP operation or JSON-RPC method.
    #[error("unknown operation: {0}")]
    MethodNotFound(String),

    /// Well-formed request the domain refuses (division by zero, ...).
    #[error("{0}")]
    Domain(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code, used in every protocol's error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::MethodNotFound(_) => "method_not_found",
            Self::Domain(_) => "domain_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
