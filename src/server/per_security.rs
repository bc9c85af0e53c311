// src/server/per_security.rs
// Single ticker endpoints under /api/per-security

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use tracing::info;

use super::{parse_exchange, query_params, AppState};
use crate::error::Result;
use crate::frame::frame_to_records;
use crate::indicator::{Indicator, SuperTrend, SuperTrendParams};
use crate::models::{StockExchange, SuperTrendQuery, TickerHistoryQuery, TickerIdentifier};
use crate::provider::StockData;

/// Placeholder listing until a ticker catalogue exists
const KNOWN_TICKERS: [&str; 2] = ["INFY", "AAPL"];

/// Routes below `/api/per-security/`; the bare root is registered by the parent router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{exchange}", get(list_tickers))
        .route("/{exchange}/{ticker}", get(ticker_info))
        .route("/{exchange}/{ticker}/history", get(ticker_history))
        .route("/{exchange}/{ticker}/indicator/super-trend", get(super_trend))
}

/// `{"nse": "National Stock Exchange of India", ...}`
pub(crate) async fn list_exchanges() -> Json<Map<String, Value>> {
    let exchanges = StockExchange::ALL
        .iter()
        .map(|e| (e.code().to_lowercase(), Value::String(e.full_name().to_string())))
        .collect();
    Json(exchanges)
}

async fn list_tickers(Path(exchange): Path<String>) -> Result<Json<Vec<&'static str>>> {
    parse_exchange(&exchange)?;
    Ok(Json(KNOWN_TICKERS.to_vec()))
}

fn resolve(exchange: &str, ticker: &str) -> Result<TickerIdentifier> {
    TickerIdentifier::new(ticker, parse_exchange(exchange)?)
}

async fn ticker_info(
    State(state): State<AppState>,
    Path((exchange, ticker)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let id = resolve(&exchange, &ticker)?;
    let info = StockData::single(state.provider.clone(), id.clone())
        .get_info(&id)
        .await?;
    Ok(Json(Value::Object(info)))
}

async fn ticker_history(
    State(state): State<AppState>,
    Path((exchange, ticker)): Path<(String, String)>,
    query: std::result::Result<Query<TickerHistoryQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let id = resolve(&exchange, &ticker)?;
    let request = query_params(query)?.history_request()?;

    let stock_data = StockData::single(state.provider.clone(), id.clone());
    let frame = stock_data.get_history_frame(&id, &request).await?;
    let history = frame_to_records(&frame)?;

    Ok(Json(json!({
        "ticker": id.symbol,
        "exchange": id.exchange,
        "history": history,
    })))
}

async fn super_trend(
    State(state): State<AppState>,
    Path((exchange, ticker)): Path<(String, String)>,
    query: std::result::Result<Query<SuperTrendQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let id = resolve(&exchange, &ticker)?;
    let query = query_params(query)?;
    query.validate()?;
    let request = query.history_request()?;

    let stock_data = StockData::single(state.provider.clone(), id.clone());
    let frame = stock_data.get_history_frame(&id, &request).await?;

    let mut indicator = SuperTrend::new(frame, query.retained_columns());
    let result = indicator.calculate_per_security(SuperTrendParams {
        lookback_periods: query.lookback_periods,
        multiplier: query.multiplier,
    })?;
    info!(ticker = %id.symbol, rows = result.height(), "super trend computed");

    Ok(Json(json!({
        "exchange": id.exchange,
        "ticker": id.symbol,
        "indicator": frame_to_records(&result)?,
    })))
}
