use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod config;
mod errors;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod testing;

use services::supabase::SupabaseClient;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ───────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── Config ────────────────────────────────────────────────
    let config = config::Config::from_env()?;
    tracing::info!(env = %config.app_env, supabase = %config.supabase_url, "Starting AdminHub backend");

    // ── Backend client ────────────────────────────────────────
    let backend = Arc::new(SupabaseClient::new(&config)?);

    let addr: SocketAddr = format!("{}:{}", config.backend_host, config.backend_port).parse()?;
    let app_state = AppState::new(config, backend);

    // ── Router ────────────────────────────────────────────────
    let app = routes::app(app_state);
    tracing::info!(%addr, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
