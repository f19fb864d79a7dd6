mod config;
mod errors;
mod extraction;
mod fetcher;
mod generation;
mod llm_client;
mod models;
mod retry;
mod routes;
mod state;
mod store;
mod validation;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job application API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Page cache: ttl={}s capacity={}; fetch: timeout={}s retries={}",
        config.cache_ttl_secs,
        config.cache_capacity,
        config.fetch_timeout_secs,
        config.fetch_max_retries
    );
    info!(
        "Rate limits: {}/hour generation, {}/minute api",
        config.rate_limit_generate_per_hour, config.rate_limit_api_per_minute
    );
    match &config.output_dir {
        Some(dir) => info!("Storing generated letters in {}", dir.display()),
        None => info!("Letter storage disabled"),
    }

    let state = AppState::from_config(config.clone())?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once a frontend domain exists

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
