//! HTTP route handlers, one module per protocol.

pub mod graphql;
pub mod jsonrpc;
pub mod odata;
pub mod rest;
pub mod soap;
pub mod system;
