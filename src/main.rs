//! Skywatch server binary.
//!
//! Reads configuration from the environment (and `.env` when present), loads
//! the cloudburst model once, and serves the HTTP API.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use skywatch::api::{AppState, router};
use skywatch::classifier::shared_model;
use skywatch::config::AppConfig;
use skywatch::dashboard::Dashboard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("skywatch=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;

    info!(
        port = config.port,
        model_path = %config.model_path.display(),
        default_city = %config.dashboard.default_city,
        "Starting Skywatch server"
    );

    let classifier = shared_model(&config.model_path)?;

    let state = AppState {
        dashboard: Dashboard::new(config.dashboard),
        classifier,
    };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Skywatch is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
