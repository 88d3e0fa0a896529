// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Dynamic DNS Update Server
//!
//! A small HTTP server that keeps a master zone file in step with the
//! addresses reported by dynamic DNS clients:
//! - Accepting dyndns2-style `GET /nic/update` requests
//! - Rewriting the hostname's A/AAAA records and bumping the SOA serial
//! - Optionally running a command (such as `rndc reload`) after each write
//!
//! The zone file is meant to be served by an authoritative nameserver that
//! shares its storage with this process.

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::Path;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Import from the library
use dyndnsd::{
    config::Config,
    metrics, middleware, nic,
    types::{AppState, ErrorResponse},
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(nic::update_zone),
    components(schemas(nic::UpdateResponse, ErrorResponse)),
    tags(
        (name = "nic", description = "Dynamic DNS update endpoint")
    ),
    info(
        title = "dyndnsd API",
        version = "0.1.0",
        description = "Dynamic DNS updates for a master zone file",
        license(name = "MIT")
    )
)]
struct ApiDoc;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Readiness check response
#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    checks: Vec<String>,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Metrics endpoint for Prometheus scraping
async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            metrics_text,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to gather metrics: {}", e),
                details: None,
            }),
        )
            .into_response(),
    }
}

/// Readiness check endpoint
///
/// Ready when the directory holding the zone file exists, since every update
/// writes a temporary file next to the zone file.
async fn ready_check(State(state): State<AppState>) -> Json<ReadyResponse> {
    let mut checks = Vec::new();
    let mut ready = true;

    let zone_file = state.updater.zone_file();
    let zone_dir = match zone_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    match tokio::fs::metadata(zone_dir).await {
        Ok(metadata) if metadata.is_dir() => {
            checks.push(format!("zone_dir_accessible: {}", zone_dir.display()));
        }
        Ok(_) => {
            ready = false;
            checks.push(format!("zone_dir_not_directory: {}", zone_dir.display()));
        }
        Err(e) => {
            warn!("zone directory {} not ready: {}", zone_dir.display(), e);
            ready = false;
            checks.push(format!("zone_dir_error: {}", e));
        }
    }

    match tokio::fs::metadata(zone_file).await {
        Ok(_) => checks.push(format!("zone_file_present: {}", zone_file.display())),
        Err(_) => checks.push(format!(
            "zone_file_absent: {} (created on first update)",
            zone_file.display()
        )),
    }

    Json(ReadyResponse { ready, checks })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("starting dyndnsd v{}", env!("CARGO_PKG_VERSION"));

    // initialize metrics
    metrics::init_metrics();

    let (config, config_path) = Config::load().context("failed to load configuration")?;
    match &config_path {
        Some(path) => info!("configuration file: {}", path.display()),
        None => info!("configuration file: none (defaults)"),
    }

    let params = &config.updater.params;
    info!("domain: {}", config.zone_name());
    info!("zone file: {}", params.zone_file.display());
    info!("serial incrementer: {}", params.serial_incrementer);
    match &params.command {
        Some(command) if !command.trim().is_empty() => info!(
            "post-update command: {} (timeout {}s)",
            command, params.command_timeout_secs
        ),
        _ => info!("post-update command: none"),
    }

    let addr = config.listen_addr();

    // create application state
    let state = AppState::new(config);

    // build main router
    let app = Router::new()
        .merge(SwaggerUi::new("/api/v1/docs").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .route("/nic/update", get(nic::update_zone))
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/ready", get(ready_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::track_metrics))
        .layer(TraceLayer::new_for_http());

    // start server
    info!("dyndnsd listening on {}", addr);
    info!("swagger ui available at http://{}/api/v1/docs", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
