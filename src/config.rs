//! Server configuration via CLI args and environment variables.

use clap::{Parser, ValueEnum};
use omniapi_service::{DEFAULT_GRAPHQL_PASSWORD, DEFAULT_GRAPHQL_USER, ServiceConfig};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// One record store served over REST, GraphQL, OData, SOAP and JSON-RPC.
#[derive(Parser, Debug, Clone)]
#[command(name = "omniapi-server", version, about)]
pub struct Config {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "OMNIAPI_HOST")]
    pub host: String,

    /// Bind port.
    #[arg(long, default_value_t = 8080, env = "OMNIAPI_PORT")]
    pub port: u16,

    /// CORS allowed origins (comma-separated). Empty for no CORS.
    #[arg(long, env = "OMNIAPI_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Username required by the GraphQL endpoint (HTTP Basic).
    #[arg(long, default_value = DEFAULT_GRAPHQL_USER, env = "OMNIAPI_GRAPHQL_USER")]
    pub graphql_user: String,

    /// Password required by the GraphQL endpoint (HTTP Basic).
    #[arg(long, default_value = DEFAULT_GRAPHQL_PASSWORD, env = "OMNIAPI_GRAPHQL_PASSWORD")]
    pub graphql_password: String,

    /// Exact bearer token for Swagger and SOAP routes. If unset, any
    /// non-empty token is accepted.
    #[arg(long, env = "OMNIAPI_BEARER_TOKEN")]
    pub bearer_token: Option<String>,

    /// Reject malformed OData `$filter`/`$orderby`/`$top` with 400 instead
    /// of ignoring them.
    #[arg(long, env = "OMNIAPI_ODATA_STRICT")]
    pub odata_strict: bool,

    /// Start with empty collections.
    #[arg(long, env = "OMNIAPI_NO_SEED")]
    pub no_seed: bool,

    /// Log level (overridden by RUST_LOG).
    #[arg(long, default_value = "info", env = "OMNIAPI_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text", env = "OMNIAPI_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Config {
    /// Parses configuration from CLI args and env vars.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// The service-layer subset of the configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            graphql_user: self.graphql_user.clone(),
            graphql_password: self.graphql_password.clone(),
            bearer_token: self.bearer_token.clone().filter(|t| !t.is_empty()),
            odata_strict: self.odata_strict,
            seed: !self.no_seed,
        }
    }
}
