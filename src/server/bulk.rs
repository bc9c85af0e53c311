// src/server/bulk.rs
// Multi ticker endpoints under /api/bulk. Responses follow request order.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{routing::post, Json, Router};
use polars::prelude::DataFrame;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::info;

use super::{json_body, parse_exchange, query_params, AppState};
use crate::error::{AppError, Result};
use crate::frame::frame_to_records;
use crate::indicator::{Indicator, SuperTrend, SuperTrendParams};
use crate::models::{ExchangeInput, StockExchange, SuperTrendQuery, TickerHistoryQuery, TickerInput};
use crate::provider::StockData;

/// Routes below `/api/bulk/`; the bare root is registered by the parent router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{exchange}", post(tickers_info))
        .route("/{exchange}/history", post(tickers_history))
        .route("/{exchange}/indicator/super-trend", post(super_trend))
}

/// `{"NSE": null, ...}` once every requested exchange is known
pub(crate) async fn list_exchange_tickers(
    body: std::result::Result<Json<ExchangeInput>, JsonRejection>,
) -> Result<Json<Map<String, Value>>> {
    let input = json_body(body)?;
    if input.exchange.is_empty() {
        return Err(AppError::InvalidInput("at least one exchange is required".to_string()));
    }
    let mut listing = Map::new();
    for raw in &input.exchange {
        let exchange = parse_exchange(raw)?;
        listing.insert(exchange.code().to_string(), Value::Null);
    }
    Ok(Json(listing))
}

/// Tickers of the body resolved for `exchange`, deduplicated in first-seen order
pub(crate) fn stock_data(state: &AppState, exchange: StockExchange, input: &TickerInput) -> Result<StockData> {
    Ok(StockData::new(state.provider.clone(), input.resolve(exchange)?))
}

/// Pair each requested ticker with its entry in `by_symbol`, in request order
fn in_request_order<T>(stock_data: &StockData, mut by_symbol: BTreeMap<String, T>) -> Vec<(String, T)> {
    stock_data
        .tickers()
        .iter()
        .filter_map(|t| by_symbol.remove(&t.symbol).map(|v| (t.symbol.clone(), v)))
        .collect()
}

async fn tickers_info(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
    body: std::result::Result<Json<TickerInput>, JsonRejection>,
) -> Result<Json<Vec<Value>>> {
    let exchange = parse_exchange(&exchange)?;
    let input = json_body(body)?;

    let stock_data = stock_data(&state, exchange, &input)?;
    let info = stock_data.get_ticker_info().await?;
    let entries = in_request_order(&stock_data, info)
        .into_iter()
        .map(|(ticker, info)| json!({ "exchange": exchange, "ticker": ticker, "info": info }))
        .collect();
    Ok(Json(entries))
}

async fn tickers_history(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
    query: std::result::Result<Query<TickerHistoryQuery>, QueryRejection>,
    body: std::result::Result<Json<TickerInput>, JsonRejection>,
) -> Result<Json<Vec<Value>>> {
    let exchange = parse_exchange(&exchange)?;
    let request = query_params(query)?.history_request()?;
    let input = json_body(body)?;

    let stock_data = stock_data(&state, exchange, &input)?;
    let frames = stock_data.get_history_frames(&request).await?;
    let mut entries = Vec::with_capacity(frames.len());
    for (ticker, frame) in in_request_order(&stock_data, frames) {
        entries.push(json!({
            "exchange": exchange,
            "ticker": ticker,
            "history": frame_to_records(&frame)?,
        }));
    }
    Ok(Json(entries))
}

/// Download history for every ticker and compute SuperTrend on it
pub(crate) async fn bulk_super_trend(
    stock_data: &StockData,
    query: &SuperTrendQuery,
) -> Result<BTreeMap<String, DataFrame>> {
    query.validate()?;
    let request = query.history_request()?;
    let frames = stock_data.get_history_frames(&request).await?;

    let mut indicator = SuperTrend::new(frames, query.retained_columns());
    let results = indicator.calculate_bulk(SuperTrendParams {
        lookback_periods: query.lookback_periods,
        multiplier: query.multiplier,
    })?;
    info!(tickers = results.len(), "bulk super trend computed");
    Ok(results)
}

async fn super_trend(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
    query: std::result::Result<Query<SuperTrendQuery>, QueryRejection>,
    body: std::result::Result<Json<TickerInput>, JsonRejection>,
) -> Result<Json<Vec<Value>>> {
    let exchange = parse_exchange(&exchange)?;
    let query = query_params(query)?;
    let input = json_body(body)?;

    let stock_data = stock_data(&state, exchange, &input)?;
    let results = bulk_super_trend(&stock_data, &query).await?;
    let mut entries = Vec::with_capacity(results.len());
    for (ticker, frame) in in_request_order(&stock_data, results) {
        entries.push(json!({
            "exchange": exchange,
            "ticker": ticker,
            "indicator": frame_to_records(&frame)?,
        }));
    }
    Ok(Json(entries))
}
