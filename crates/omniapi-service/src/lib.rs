//! OmniAPI Service: the protocol adapter layer.
//!
//! This crate contains everything that is independent of the transport:
//! record types, the shared `EntityStore`, the per-protocol credential
//! policy, and one adapter per API paradigm (OData, GraphQL, SOAP,
//! JSON-RPC, plus the REST naming convention).
//!
//! The HTTP crate (`omniapi-http`) only extracts bodies, headers and paths,
//! calls into these adapters and writes their output to the wire.
//!
//! **Zero transport dependencies**: no axum, no tower, no hyper.

pub mod auth;
pub mod error;
pub mod graphql;
pub mod jsonrpc;
pub mod odata;
pub mod rest;
pub mod seed;
pub mod soap;
pub mod store;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use auth::AuthGate;
use graphql::Schema;
use jsonrpc::Dispatcher;
use store::EntityStore;

pub const DEFAULT_GRAPHQL_USER: &str = "graphql-user";
pub const DEFAULT_GRAPHQL_PASSWORD: &str = "graphql-pass";

/// Configuration subset relevant to the service layer.
///
/// Transport-specific config (host, port, CORS origins, log format) stays
/// in the binary crate's `Config` struct.
pub struct ServiceConfig {
    pub graphql_user: String,
    pub graphql_password: String,
    pub bearer_token: Option<String>,
    pub odata_strict: bool,
    pub seed: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            graphql_user: DEFAULT_GRAPHQL_USER.to_owned(),
            graphql_password: DEFAULT_GRAPHQL_PASSWORD.to_owned(),
            bearer_token: None,
            odata_strict: false,
            seed: true,
        }
    }
}

/// Shared service state, cloneable across all transport handlers.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<Inner>,
}

struct Inner {
    store: EntityStore,
    auth: AuthGate,
    graphql: Schema,
    jsonrpc: Dispatcher,
    odata_strict: bool,
    start_time: Instant,
}

impl ServiceState {
    /// Creates a new service state from config.
    pub fn new(config: &ServiceConfig) -> Self {
        let store = if config.seed {
            EntityStore::seeded()
        } else {
            EntityStore::new()
        };
        Self {
            inner: Arc::new(Inner {
                store,
                auth: AuthGate::new(
                    config.graphql_user.clone(),
                    config.graphql_password.clone(),
                    config.bearer_token.clone(),
                ),
                graphql: Schema::new(),
                jsonrpc: Dispatcher::new(),
                odata_strict: config.odata_strict,
                start_time: Instant::now(),
            }),
        }
    }

    /// Seeded state with default credentials (for tests and ephemeral use).
    pub fn new_in_memory() -> Self {
        Self::new(&ServiceConfig::default())
    }

    // --- Accessors ---

    pub fn store(&self) -> &EntityStore {
        &self.inner.store
    }

    pub fn auth(&self) -> &AuthGate {
        &self.inner.auth
    }

    pub fn graphql(&self) -> &Schema {
        &self.inner.graphql
    }

    pub fn jsonrpc(&self) -> &Dispatcher {
        &self.inner.jsonrpc
    }

    pub fn odata_strict(&self) -> bool {
        self.inner.odata_strict
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}
