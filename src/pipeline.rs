//! Batch jobs that persist daily ticker history
//!
//! `insert_history` downloads in batches: everything (`period=max`) on an
//! empty store, otherwise from the last stored date up to today.

use async_trait::async_trait;
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::common::create_batches;
use crate::db::{prepare_ticker_history_rows, HistoryStore, TickerHistoryRow};
use crate::error::{AppError, Result};
use crate::models::{HistoryRequest, Interval, Period, StockExchange, TickerIdentifier};
use crate::provider::{SharedProvider, StockData};

/// Where prepared rows go
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn latest_date(&self) -> Result<Option<NaiveDate>>;
    async fn insert_rows(&self, rows: &[TickerHistoryRow]) -> Result<u64>;
}

#[async_trait]
impl HistorySink for HistoryStore {
    async fn latest_date(&self) -> Result<Option<NaiveDate>> {
        HistoryStore::latest_date(self).await
    }

    async fn insert_rows(&self, rows: &[TickerHistoryRow]) -> Result<u64> {
        HistoryStore::insert_rows(self, rows).await
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertSummary {
    pub batches: usize,
    pub inserted: u64,
    /// Tickers with no usable download
    pub skipped: Vec<String>,
}

/// Ticker symbols from the first column of a CSV file with a header row
pub fn read_tickers(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut tickers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(symbol) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) {
            tickers.push(symbol.to_string());
        }
    }
    if tickers.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "no tickers found in {}",
            path.display()
        )));
    }
    Ok(tickers)
}

/// Download request for this run given the last stored date
pub fn history_request_since(last_date: Option<NaiveDate>, today: NaiveDate) -> HistoryRequest {
    match last_date {
        None => HistoryRequest {
            period: Period::Max,
            interval: Interval::OneDay,
            start: None,
            end: None,
        },
        Some(last) => HistoryRequest {
            period: Period::Max,
            interval: Interval::OneDay,
            start: Some(last),
            end: Some(today),
        },
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} batches ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

pub async fn insert_history(
    sink: &dyn HistorySink,
    provider: SharedProvider,
    tickers: &[String],
    exchange: StockExchange,
    batch_size: usize,
    today: NaiveDate,
) -> Result<InsertSummary> {
    let batches = create_batches(tickers, batch_size);
    debug!("total batches: {}", batches.len());

    info!("getting last inserted date");
    let last_date = sink.latest_date().await?;
    match last_date {
        None => info!("no latest date found, running for max date"),
        Some(d) => info!("last run date: {}, downloading from {} to {}", d, d, today),
    }
    let request = history_request_since(last_date, today);

    let mut summary = InsertSummary {
        batches: batches.len(),
        ..Default::default()
    };
    let pb = progress_bar(batches.len());

    for batch in &batches {
        debug!("tickers of current batch: {:?}", batch);
        let mut ids = Vec::with_capacity(batch.len());
        for raw in batch {
            match TickerIdentifier::new(raw, exchange) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    warn!("{}, so skipping '{}'", e, raw);
                    summary.skipped.push(raw.clone());
                }
            }
        }

        let stock_data = StockData::new(provider.clone(), ids);
        let mut rows = Vec::new();
        for (ticker, outcome) in stock_data.fetch_history_each(&request).await {
            match outcome.and_then(|candles| prepare_ticker_history_rows(&candles, &ticker.symbol)) {
                Ok(prepared) => rows.extend(prepared),
                Err(e) => {
                    warn!("{}, so skipping it.", e);
                    summary.skipped.push(ticker.symbol);
                }
            }
        }

        let inserted = sink.insert_rows(&rows).await?;
        info!("successfully inserted {} rows", inserted);
        summary.inserted += inserted;
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(summary)
}
