//! Market data provider access
//!
//! `MarketDataProvider` is the seam to the external finance data source;
//! `StockData` fans a list of tickers out over it.

pub mod yahoo;

use async_trait::async_trait;
use futures::future::join_all;
use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::frame::{history_frame, Candle};
use crate::models::{HistoryRequest, TickerIdentifier};

pub use yahoo::YahooFinance;

/// Ticker metadata as returned by the provider
pub type TickerInfo = Map<String, Value>;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Descriptive data for a provider symbol (e.g. `INFY.NS`)
    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo>;

    /// Price bars for a provider symbol, oldest first
    async fn ticker_history(&self, symbol: &str, request: &HistoryRequest) -> Result<Vec<Candle>>;
}

pub type SharedProvider = Arc<dyn MarketDataProvider>;

/// A set of tickers on one provider, keyed by plain upper-case symbol
#[derive(Clone)]
pub struct StockData {
    tickers: Vec<TickerIdentifier>,
    provider: SharedProvider,
}

impl StockData {
    pub fn new(provider: SharedProvider, tickers: Vec<TickerIdentifier>) -> Self {
        Self { tickers, provider }
    }

    pub fn single(provider: SharedProvider, ticker: TickerIdentifier) -> Self {
        Self::new(provider, vec![ticker])
    }

    pub fn tickers(&self) -> &[TickerIdentifier] {
        &self.tickers
    }

    pub async fn get_ticker_info(&self) -> Result<BTreeMap<String, TickerInfo>> {
        let fetches = self.tickers.iter().map(|t| {
            let provider = Arc::clone(&self.provider);
            async move {
                let symbol = t.provider_symbol();
                debug!("fetching info for {}", symbol);
                provider.ticker_info(&symbol).await.map(|info| (t.symbol.clone(), info))
            }
        });
        join_all(fetches).await.into_iter().collect()
    }

    /// Fetch every ticker, keeping per-ticker outcomes
    pub async fn fetch_history_each(
        &self,
        request: &HistoryRequest,
    ) -> Vec<(TickerIdentifier, Result<Vec<Candle>>)> {
        let fetches = self.tickers.iter().map(|t| {
            let provider = Arc::clone(&self.provider);
            async move {
                let symbol = t.provider_symbol();
                debug!(
                    "fetching history for {} (period={}, interval={}, start={:?}, end={:?})",
                    symbol,
                    request.period.as_str(),
                    request.interval.as_str(),
                    request.start,
                    request.end
                );
                let outcome = provider.ticker_history(&symbol, request).await;
                if let Err(e) = &outcome {
                    warn!("history download failed for {}: {}", symbol, e);
                }
                (t.clone(), outcome)
            }
        });
        join_all(fetches).await
    }

    /// Fetch every ticker; the first failure fails the whole call
    pub async fn get_ticker_history(&self, request: &HistoryRequest) -> Result<BTreeMap<String, Vec<Candle>>> {
        self.fetch_history_each(request)
            .await
            .into_iter()
            .map(|(t, outcome)| outcome.map(|candles| (t.symbol, candles)))
            .collect()
    }

    /// History normalized into frames (see [`history_frame`])
    pub async fn get_history_frames(&self, request: &HistoryRequest) -> Result<BTreeMap<String, DataFrame>> {
        let mut frames = BTreeMap::new();
        for (symbol, candles) in self.get_ticker_history(request).await? {
            let df = history_frame(&candles)?;
            frames.insert(symbol, df);
        }
        Ok(frames)
    }

    /// Frame of a single ticker
    pub async fn get_history_frame(&self, ticker: &TickerIdentifier, request: &HistoryRequest) -> Result<DataFrame> {
        let candles = self.provider.ticker_history(&ticker.provider_symbol(), request).await?;
        Ok(history_frame(&candles)?)
    }

    pub async fn get_info(&self, ticker: &TickerIdentifier) -> Result<TickerInfo> {
        self.provider
            .ticker_info(&ticker.provider_symbol())
            .await
            .map_err(|e| match e {
                AppError::Provider { message, .. } => AppError::provider(ticker.symbol.clone(), message),
                other => other,
            })
    }
}
