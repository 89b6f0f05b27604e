use anyhow::Context;
use tracing_subscriber::EnvFilter;

use guest_checkin::config::{self, Backend};
use guest_checkin::state::AppState;
use guest_checkin::{app, is_production};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting guest check-in API in {:?} mode", config.environment);

    if is_production!() && config.server.backend == Backend::Memory {
        tracing::warn!("Production mode with the in-memory backend; data is lost on restart");
    }

    let state = AppState::from_config(config.clone())
        .await
        .context("failed to initialize application state")?;
    let app = app::router(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Guest check-in API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
