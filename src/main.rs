// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::aggregation_service::AirQualityService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::csv_sink::CsvReadingSink;
use crate::infrastructure::openaq_source::OpenAqSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{air_quality, health_check};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let app_config = load_app_config()?;
    let settings = app_config.aggregation_settings();

    // Create upstream source (infrastructure layer)
    let source = Arc::new(OpenAqSource::new(
        app_config.openaq.base_url.clone(),
        app_config.openaq.api_key.clone(),
        Duration::from_secs(app_config.openaq.request_timeout_secs),
    )?);

    // Create services (application layer)
    let mut air_quality_service = AirQualityService::new(source, settings);
    if let Some(path) = app_config.persistence.csv_path.clone() {
        tracing::info!("Appending results to {}", path.display());
        air_quality_service = air_quality_service.with_sink(Arc::new(CsvReadingSink::new(path)));
    }

    // Create application state
    let state = Arc::new(AppState {
        air_quality_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/air-quality", get(air_quality))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = app_config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind_address))?;
    tracing::info!(
        "Starting air-quality-aggregator on {} (radius {}m, up to {} stations, deadline {:?})",
        addr,
        settings.radius_meters,
        settings.max_stations,
        settings.deadline
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
