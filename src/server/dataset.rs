// src/server/dataset.rs
// Screens built on bulk indicators, under /api/dataset/indicator

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{routing::post, Json, Router};
use serde_json::Value;
use tracing::info;

use super::bulk::{bulk_super_trend, stock_data};
use super::{json_body, parse_exchange, query_params, AppState};
use crate::error::Result;
use crate::frame::frame_to_records;
use crate::indicator::recent_trend_dataset;
use crate::models::{ResultFormat, SuperTrendRecentNQuery, TickerInput};

pub fn routes() -> Router<AppState> {
    Router::new().route("/{exchange}/indicator/super-trend", post(super_trend_recent_n))
}

/// Tickers whose SuperTrend has been bullish on each of the last `recent_n` bars
///
/// `detail` returns the stacked rows (`date, ticker, ...`), `ticker_only`
/// just the surviving symbols.
async fn super_trend_recent_n(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
    query: std::result::Result<Query<SuperTrendRecentNQuery>, QueryRejection>,
    body: std::result::Result<Json<TickerInput>, JsonRejection>,
) -> Result<Json<Value>> {
    let exchange = parse_exchange(&exchange)?;
    let query = query_params(query)?;
    query.validate()?;
    let input = json_body(body)?;

    let stock_data = stock_data(&state, exchange, &input)?;
    let results = bulk_super_trend(&stock_data, &query.super_trend_query()).await?;
    let dataset = recent_trend_dataset(results, query.recent_n)?;
    info!(
        exchange = %exchange,
        recent_n = query.recent_n,
        kept = dataset.len(),
        "super trend recent n dataset built"
    );

    let body = match query.result_format {
        ResultFormat::TickerOnly => {
            Value::Array(dataset.into_keys().map(Value::String).collect())
        }
        ResultFormat::Detail => {
            let mut rows = Vec::new();
            for frame in dataset.values() {
                rows.extend(frame_to_records(frame)?.into_iter().map(Value::Object));
            }
            Value::Array(rows)
        }
    };
    Ok(Json(body))
}
