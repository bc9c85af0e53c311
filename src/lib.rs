//! # Factor Investing
//!
//! Stock data from a market data provider, normalized into tables, with
//! SuperTrend computed per security or in bulk.
//!
//! ## Layers
//! - `moving_averages`, `volatility`, `trend`: slice based indicator math
//! - `frame`, `indicator`: table level indicators over polars frames
//! - `provider`: market data access (Yahoo Finance chart API)
//! - `server`: axum web API
//! - `db`, `pipeline`: PostgreSQL history store and its batch loader
//!
//! ## Example
//! ```
//! use factor_investing::super_trend;
//!
//! let highs = vec![10.0, 11.0, 12.0, 13.0, 11.0, 9.0, 13.0];
//! let lows = vec![8.0, 9.0, 10.0, 11.0, 7.0, 7.0, 11.0];
//! let closes = vec![9.0, 10.0, 11.0, 12.5, 7.5, 8.5, 12.9];
//!
//! let st = super_trend(&highs, &lows, &closes, 2, 1.0);
//! assert_eq!(st.condensed_rows(), vec![2, 3, 4, 5, 6]);
//! ```

pub mod common;
pub mod config;
pub mod db;
pub mod error;
pub mod frame;
pub mod indicator;
pub mod models;
pub mod moving_averages;
pub mod pipeline;
pub mod provider;
pub mod server;
pub mod trend;
pub mod volatility;

// Re-export commonly used items at crate root
pub use config::Settings;
pub use error::{AppError, Result};
pub use indicator::{recent_trend_dataset, Indicator, IndicatorData, SuperTrend, SuperTrendParams};
pub use models::{HistoryRequest, Interval, Period, StockExchange, TickerIdentifier};
pub use moving_averages::wilders_ma;
pub use provider::{MarketDataProvider, SharedProvider, StockData, YahooFinance};
pub use trend::{super_trend, SuperTrendSeries};
pub use volatility::{atr, true_range};
