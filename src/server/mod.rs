//! Factor Investing web API
//!
//! Routes:
//! - `GET  /`
//! - `/api/per-security/...` single ticker info, history and SuperTrend
//! - `/api/bulk/...` the same for a list of tickers (JSON body `{"ticker": [...]}`)
//! - `/api/dataset/indicator/...` screens built on bulk indicators

pub mod bulk;
pub mod dataset;
pub mod per_security;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::models::StockExchange;
use crate::provider::SharedProvider;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub provider: SharedProvider,
}

impl AppState {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        // collection roots answer with and without the trailing slash
        .route("/api/per-security", get(per_security::list_exchanges))
        .route("/api/per-security/", get(per_security::list_exchanges))
        .route("/api/bulk", post(bulk::list_exchange_tickers))
        .route("/api/bulk/", post(bulk::list_exchange_tickers))
        .nest("/api/per-security", per_security::routes())
        .nest("/api/bulk", bulk::routes())
        .nest("/api/dataset/indicator", dataset::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `settings.bind_addr` and serve until the process stops
pub async fn serve(settings: &Settings, provider: SharedProvider) -> Result<()> {
    info!("Registering routes:");
    info!("  GET  /api/per-security/{{exchange}}/{{ticker}}[/history|/indicator/super-trend]");
    info!("  POST /api/bulk/{{exchange}}[/history|/indicator/super-trend]");
    info!("  POST /api/dataset/indicator/{{exchange}}/indicator/super-trend");

    let app = router(AppState::new(provider));
    let listener = TcpListener::bind(settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "Server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Factor Investing API is running" }))
}

/// Exchange path segment; unknown codes are a 404
pub(crate) fn parse_exchange(raw: &str) -> Result<StockExchange> {
    raw.parse()
}

pub(crate) fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(q)| q)
        .map_err(|e| AppError::InvalidInput(e.body_text()))
}

pub(crate) fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(b)| b)
        .map_err(|e| AppError::InvalidInput(e.body_text()))
}
