//! HTTP middleware: request ID tracking, per-protocol authentication.

pub mod auth;
pub mod request_id;
