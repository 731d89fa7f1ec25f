//! Tibia API
//!
//! REST API and CLI that re-publish tibia.com pages as structured JSON.

mod cli;
mod config;
mod error;
mod retry;
mod routes;
mod scraper;
mod types;

use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::routes::AppState;
use crate::scraper::{Fetcher, HouseTable};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => run_server(host, port).await,
        Commands::Parse {
            page,
            input,
            repair_encoding,
            context,
        } => cli::run_parse(page, input, repair_encoding, context),
    }
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tibia_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Upstream: {}", config.upstream.base_url);

    let fetcher = Fetcher::new(&config.upstream, (&config.retry).into())?;

    // Reference data is loaded before the listener starts and never changes.
    tracing::info!("Loading house mapping...");
    let houses = HouseTable::load(&fetcher, &config.reference.houses_url).await;

    let state = Arc::new(AppState {
        config: config.clone(),
        fetcher,
        houses,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/v1/character/:name", get(routes::character))
        .route("/v1/guild/:name", get(routes::guild))
        .route("/v1/guilds/:world", get(routes::guilds))
        .route(
            "/v1/highscores/:world/:category/:vocation/:page",
            get(routes::highscores),
        )
        .route("/v1/worlds", get(routes::worlds))
        .route("/v1/world/:name", get(routes::world))
        .route("/v1/killstatistics/:world", get(routes::killstatistics))
        .route("/v1/news/id/:id", get(routes::news))
        .route("/v1/spells", get(routes::spells))
        .route("/v1/creatures", get(routes::creatures))
        .route("/v1/houses/:world/:town", get(routes::houses))
        .route("/v1/house/:world/:id", get(routes::house))
        .fallback(routes::fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
