//! GridPlay API
//!
//! REST API and CLI for race win probabilities, fan battles and telemetry samples.

mod aggregator;
mod battles;
mod cli;
mod config;
mod model;
mod routes;
mod storage;
mod telemetry;
mod types;

use axum::{routing::get, routing::post, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::model::load_oracle;
use crate::routes::AppState;
use crate::storage::BattleRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging();

    match cli.command {
        Commands::Serve { host, port } => run_server(host, port).await,
        Commands::Predict {
            input,
            format,
            model,
            no_model,
        } => cli::run_predict(input, format, model, no_model),
        Commands::Leaderboard { race_id, limit, db } => cli::run_leaderboard(race_id, limit, db),
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridplay_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
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
    tracing::info!("Battle database: {}", config.storage.db_path);

    let oracle = load_oracle(&config.model);
    let repo = BattleRepository::new(Path::new(&config.storage.db_path))?;

    let state = Arc::new(AppState {
        oracle,
        config: config.clone(),
        repo: Mutex::new(repo),
    });

    let telemetry_routes = Router::new()
        .route("/races", get(routes::races))
        .route("/race/:race_id/drivers", get(routes::drivers))
        .route(
            "/race/:race_id/telemetry/:driver_id",
            get(routes::driver_telemetry),
        );

    let battle_routes = Router::new()
        .route("/submit", post(routes::submit_battle))
        .route("/leaderboard/:race_id", get(routes::leaderboard));

    let app = Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/model/info", get(routes::model_info))
        .route("/api/predict/post_qualifying", post(routes::post_qualifying))
        .nest("/api/telemetry", telemetry_routes)
        .nest("/api/battles", battle_routes)
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
