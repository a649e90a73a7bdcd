//! Per-protocol credential policy.
//!
//! Credential extraction is transport-specific (the HTTP layer hands over
//! the raw `Authorization` header). This module decides, for a given
//! protocol, whether that header satisfies the policy.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;

use crate::error::ServiceError;

/// The six API paradigms served over the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    OpenApi,
    Swagger,
    GraphQl,
    OData,
    Soap,
    JsonRpc,
}

/// Credential a protocol demands before its adapter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    None,
    Bearer,
    Basic,
}

impl Protocol {
    /// The fixed policy table.
    pub fn requirement(self) -> Requirement {
        match self {
            Self::OpenApi | Self::OData | Self::JsonRpc => Requirement::None,
            Self::Swagger | Self::Soap => Requirement::Bearer,
            Self::GraphQl => Requirement::Basic,
        }
    }
}

/// Verifies credentials against the policy table.
#[derive(Clone)]
pub struct AuthGate {
    basic_user: String,
    basic_password: String,
    /// When set, bearer tokens must match exactly; otherwise any non-empty
    /// token is accepted.
    bearer_token: Option<String>,
}

impl AuthGate {
    pub fn new(basic_user: String, basic_password: String, bearer_token: Option<String>) -> Self {
        Self {
            basic_user,
            basic_password,
            bearer_token,
        }
    }

    /// Checks the raw `Authorization` header value for `protocol`.
    pub fn check(&self, protocol: Protocol, authorization: Option<&str>) -> Result<(), ServiceError> {
        let ok = match protocol.requirement() {
            Requirement::None => true,
            Requirement::Bearer => authorization
                .and_then(|v| credentials(v, "Bearer"))
                .is_some_and(|token| self.check_bearer(token.trim())),
            Requirement::Basic => authorization
                .and_then(|v| credentials(v, "Basic"))
                .and_then(decode_basic)
                .is_some_and(|(user, pass)| self.check_basic(&user, &pass)),
        };

        if ok {
            Ok(())
        } else {
            tracing::warn!(?protocol, "rejected request credentials");
            Err(ServiceError::Unauthorized)
        }
    }

    fn check_bearer(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        self.bearer_token
            .as_ref()
            .is_none_or(|expected| ct_eq(token.as_bytes(), expected.as_bytes()))
    }

    fn check_basic(&self, user: &str, password: &str) -> bool {
        // Evaluate both so timing does not reveal which half failed.
        let user_ok = ct_eq(user.as_bytes(), self.basic_user.as_bytes());
        let pass_ok = ct_eq(password.as_bytes(), self.basic_password.as_bytes());
        user_ok & pass_ok
    }
}

/// Returns the credentials of an `Authorization` value when its scheme
/// matches `scheme`, compared case-insensitively.
fn credentials<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let (name, rest) = value.trim_start().split_once(' ')?;
    name.eq_ignore_ascii_case(scheme).then_some(rest)
}

/// Decodes the payload of a `Basic` header into `(user, password)`.
fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_owned(), pass.to_owned()))
}

/// Constant-time comparison of two byte slices.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.ct_eq(b).into()
}
