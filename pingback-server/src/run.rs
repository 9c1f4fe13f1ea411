use dotenvy::dotenv;
use std::net::SocketAddr;

use crate::config::Config;
use crate::handlers;
use crate::util::{SigDown, Telemetry};

/// Initializes and runs the pingback server until SIGTERM or SIGINT.
///
/// - Loads `.env` variables.
/// - Installs logging, plus OTLP trace export when `OTEL_*` is set.
/// - Loads [`Config`] from `--config` / `$CONFIG`.
/// - Serves [`handlers::routes`] with graceful shutdown.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register()?;

    let config = Config::load()?;
    let app = handlers::routes(&config);

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!(
        path = config.path(),
        environment = ?config.gateway().environment(),
        "Starting pingback server at http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let sig_down = SigDown::try_new()?;
    let graceful_shutdown = async move { sig_down.recv().await };
    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    tracing::info!("Pingback server stopped");
    Ok(())
}
