//! Sentinel imagery API service.
//!
//! HTTP server translating map-client requests into Earth Engine calls:
//! composited Sentinel-2 layers, a region list, and health reporting.

use anyhow::Result;
use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use clap::Parser;
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sentinel_api::{handlers, state::AppState};

#[derive(Parser, Debug)]
#[command(name = "sentinel-api")]
#[command(about = "Sentinel-2 imagery API backed by Google Earth Engine")]
struct Args {
    /// Listen address (defaults to 0.0.0.0:$PORT, falling back to 5000)
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level (defaults to debug when DEBUG=true, info otherwise)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let debug_env = env::var("DEBUG")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);
    let level = match args.log_level.as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("warn") => Level::WARN,
        Some("error") => Level::ERROR,
        Some(_) => Level::INFO,
        None if debug_env => Level::DEBUG,
        None => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    info!("Starting sentinel-api server");

    // Initialize application state; a failed Earth Engine handshake leaves
    // the process serving in degraded mode.
    let state = Arc::new(AppState::new().await);

    // Build router
    let app = Router::new()
        .route("/", get(handlers::index_handler))
        .route(
            "/api/get_sentinel_image",
            post(handlers::get_sentinel_image_handler),
        )
        .route("/api/regions", get(handlers::regions_handler))
        // Health check (both paths for compatibility with older clients)
        .route("/api/health", get(handlers::health_handler))
        .route("/health", get(handlers::health_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    // Parse listen address
    let listen = args.listen.unwrap_or_else(|| {
        let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
        format!("0.0.0.0:{}", port)
    });
    let addr: SocketAddr = listen.parse()?;
    info!(address = %addr, "Listening");

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
