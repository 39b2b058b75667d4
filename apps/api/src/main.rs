mod config;
mod curriculum;
mod errors;
mod extraction;
mod gemini;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::curriculum::Catalog;
use crate::gemini::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting curriculum API v{}", env!("CARGO_PKG_VERSION"));

    // Load the curriculum catalog (bundled, or the CURRICULUM_PATH override)
    let catalog = match &config.curriculum_path {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::embedded()?,
    };

    // Initialize Gemini client
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; extraction and generation requests will fail");
    }
    let gemini = GeminiClient::new(config.gemini_api_key.clone(), &config.gemini_api_base)?;
    info!("Gemini client initialized (model: {})", gemini::MODEL);

    let state = AppState {
        gemini,
        catalog: Arc::new(catalog),
        config: config.clone(),
    };

    let app: Router = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
