mod binding;
mod config;
mod controller;
mod document;
mod dom;
mod editor;
mod errors;
mod handlers;
mod models;
mod render;
mod routes;
mod sources;
mod state;
mod template;

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume studio v{}", env!("CARGO_PKG_VERSION"));
    info!(
        resume_api = config.resume_api_url.as_deref().unwrap_or("fixture only"),
        fixture = %config.mock_data_path.display(),
        "resume data source configured"
    );
    match (&config.templates_url, &config.templates_dir) {
        (Some(url), _) => info!("Templates served from {url}"),
        (None, Some(dir)) => info!("Templates read from {}", dir.display()),
        (None, None) => info!("Using bundled templates"),
    }
    if config.optimize_api_url.is_none() {
        info!("OPTIMIZE_API_URL not set; optimize is disabled");
    }
    if config.export_api_url.is_none() {
        info!("EXPORT_API_URL not set; PDF export is disabled");
    }

    let state = AppState::from_config(config.clone());

    let sweeper = state.clone();
    let max_idle = Duration::from_secs(config.session_idle_secs);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            sweeper.evict_idle(max_idle).await;
        }
    });

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor is served from a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
