//! OmniAPI Server entry point.

mod config;

use std::net::SocketAddr;

use omniapi_http::AppState;
use omniapi_service::ServiceState;
use tracing_subscriber::EnvFilter;

use config::{Config, LogFormat};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }

    let service = ServiceState::new(&config.service_config());
    let state = AppState::new(service, config.cors_origins.clone());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        seeded = !config.no_seed,
        odata_strict = config.odata_strict,
        fixed_bearer_token = config.bearer_token.is_some(),
        "OmniAPI Server starting",
    );

    let app = omniapi_http::router(state);

    let addr = SocketAddr::new(config.host.parse().expect("invalid host"), config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    tracing::info!(%addr, "OmniAPI Server ready");

    omniapi_http::serve(listener, app, shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("OmniAPI Server shut down");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install signal handler");
    tracing::info!("Shutdown signal received");
}
