// src/models.rs
// Request vocabulary shared by the API, the provider client and the pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

// ============================================================================
// Provider enums
// ============================================================================

/// Look-back window understood by the data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum Period {
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }
}

/// Spacing between data points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
    #[serde(rename = "90m")]
    NinetyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }
}

// ============================================================================
// Exchanges
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StockExchange {
    Nse,
    Bse,
    Tse,
    Lse,
    Hkex,
    Xetra,
    Sse,
    Asx,
    Nasdaq,
    Nyse,
    Bmv,
    Tsx,
    Euronext,
}

impl StockExchange {
    pub const ALL: [StockExchange; 13] = [
        StockExchange::Nse,
        StockExchange::Bse,
        StockExchange::Tse,
        StockExchange::Lse,
        StockExchange::Hkex,
        StockExchange::Xetra,
        StockExchange::Sse,
        StockExchange::Asx,
        StockExchange::Nasdaq,
        StockExchange::Nyse,
        StockExchange::Bmv,
        StockExchange::Tsx,
        StockExchange::Euronext,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            StockExchange::Nse => "NSE",
            StockExchange::Bse => "BSE",
            StockExchange::Tse => "TSE",
            StockExchange::Lse => "LSE",
            StockExchange::Hkex => "HKEX",
            StockExchange::Xetra => "XETRA",
            StockExchange::Sse => "SSE",
            StockExchange::Asx => "ASX",
            StockExchange::Nasdaq => "NASDAQ",
            StockExchange::Nyse => "NYSE",
            StockExchange::Bmv => "BMV",
            StockExchange::Tsx => "TSX",
            StockExchange::Euronext => "EURONEXT",
        }
    }

    /// Suffix the provider appends to a symbol listed on this exchange
    pub fn provider_suffix(&self) -> &'static str {
        match self {
            StockExchange::Nse => ".NS",
            StockExchange::Bse => ".BO",
            StockExchange::Tse => ".T",
            StockExchange::Lse => ".L",
            StockExchange::Hkex => ".H",
            StockExchange::Xetra => ".X",
            StockExchange::Sse => ".S",
            StockExchange::Asx => ".A",
            StockExchange::Nasdaq => ".N",
            StockExchange::Nyse => ".Y",
            StockExchange::Bmv => ".M",
            StockExchange::Tsx => ".C",
            StockExchange::Euronext => ".F",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            StockExchange::Nse => "National Stock Exchange of India",
            StockExchange::Bse => "Bombay Stock Exchange",
            StockExchange::Tse => "Tokyo Stock Exchange",
            StockExchange::Lse => "London Stock Exchange",
            StockExchange::Hkex => "Hong Kong Stock Exchange",
            StockExchange::Xetra => "Frankfurt Stock Exchange",
            StockExchange::Sse => "Shanghai Stock Exchange",
            StockExchange::Asx => "Australian Securities Exchange",
            StockExchange::Nasdaq => "NASDAQ Stock Exchange",
            StockExchange::Nyse => "New York Stock Exchange",
            StockExchange::Bmv => "Mexico Stock Exchange",
            StockExchange::Tsx => "Toronto Stock Exchange",
            StockExchange::Euronext => "Euronext",
        }
    }
}

impl FromStr for StockExchange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        StockExchange::ALL
            .iter()
            .find(|e| e.code().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("unknown exchange '{}'", wanted)))
    }
}

impl fmt::Display for StockExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for StockExchange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for StockExchange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tickers
// ============================================================================

/// Drop a provider exchange suffix: `INFY.NS` -> `INFY`
pub fn remove_exchange_symbol(symbol: &str) -> &str {
    symbol.split('.').next().unwrap_or(symbol)
}

/// A ticker resolved against its exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerIdentifier {
    pub symbol: String,
    pub exchange: StockExchange,
}

impl TickerIdentifier {
    /// Upper-cases the symbol and strips any suffix the caller already added
    pub fn new(symbol: &str, exchange: StockExchange) -> Result<Self> {
        let symbol = remove_exchange_symbol(symbol.trim()).to_uppercase();
        if symbol.is_empty() {
            return Err(AppError::InvalidInput("ticker symbol must not be empty".to_string()));
        }
        Ok(Self { symbol, exchange })
    }

    pub fn provider_symbol(&self) -> String {
        format!("{}{}", self.symbol, self.exchange.provider_suffix())
    }
}

/// Body of the bulk endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TickerInput {
    pub ticker: Vec<String>,
}

impl TickerInput {
    /// Resolve every ticker for `exchange`, keeping first-seen order and dropping repeats
    pub fn resolve(&self, exchange: StockExchange) -> Result<Vec<TickerIdentifier>> {
        if self.ticker.is_empty() {
            return Err(AppError::InvalidInput("at least one ticker is required".to_string()));
        }
        let mut resolved: Vec<TickerIdentifier> = Vec::with_capacity(self.ticker.len());
        for raw in &self.ticker {
            let id = TickerIdentifier::new(raw, exchange)?;
            if !resolved.iter().any(|r| r.symbol == id.symbol) {
                resolved.push(id);
            }
        }
        Ok(resolved)
    }
}

/// Body of `POST /api/bulk/`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeInput {
    pub exchange: Vec<String>,
}

// ============================================================================
// Query parameters
// ============================================================================

/// What to download for a ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryRequest {
    pub period: Period,
    pub interval: Interval,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl HistoryRequest {
    /// Dates, when present, take precedence over `period`
    pub fn uses_date_range(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(AppError::InvalidInput(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TickerHistoryQuery {
    #[serde(default)]
    pub interval: Interval,
    /// Mutually exclusive with `start_date` / `end_date`
    #[serde(default)]
    pub period: Period,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TickerHistoryQuery {
    pub fn history_request(&self) -> Result<HistoryRequest> {
        let request = HistoryRequest {
            period: self.period,
            interval: self.interval,
            start: self.start_date,
            end: self.end_date,
        };
        request.validate()?;
        Ok(request)
    }
}

fn default_lookback_periods() -> usize {
    10
}

fn default_multiplier() -> f64 {
    3.0
}

fn default_recent_n() -> usize {
    5
}

/// Parameters shared by the SuperTrend endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuperTrendQuery {
    #[serde(default)]
    pub interval: Interval,
    #[serde(default)]
    pub period: Period,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_lookback_periods")]
    pub lookback_periods: usize,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Comma separated source columns to keep next to the indicator
    pub retain_source_column: Option<String>,
}

impl Default for SuperTrendQuery {
    fn default() -> Self {
        Self {
            interval: Interval::default(),
            period: Period::default(),
            start_date: None,
            end_date: None,
            lookback_periods: default_lookback_periods(),
            multiplier: default_multiplier(),
            retain_source_column: None,
        }
    }
}

impl SuperTrendQuery {
    pub fn history_request(&self) -> Result<HistoryRequest> {
        TickerHistoryQuery {
            interval: self.interval,
            period: self.period,
            start_date: self.start_date,
            end_date: self.end_date,
        }
        .history_request()
    }

    pub fn validate(&self) -> Result<()> {
        validate_super_trend_params(self.lookback_periods, self.multiplier)
    }

    pub fn retained_columns(&self) -> Option<Vec<String>> {
        parse_column_list(self.retain_source_column.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    Detail,
    #[default]
    TickerOnly,
}

/// Parameters of the "SuperTrend recent N" dataset
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuperTrendRecentNQuery {
    #[serde(default)]
    pub interval: Interval,
    #[serde(default)]
    pub period: Period,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_lookback_periods")]
    pub lookback_periods: usize,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    pub retain_source_column: Option<String>,
    #[serde(default = "default_recent_n")]
    pub recent_n: usize,
    #[serde(default)]
    pub result_format: ResultFormat,
}

impl SuperTrendRecentNQuery {
    pub fn super_trend_query(&self) -> SuperTrendQuery {
        SuperTrendQuery {
            interval: self.interval,
            period: self.period,
            start_date: self.start_date,
            end_date: self.end_date,
            lookback_periods: self.lookback_periods,
            multiplier: self.multiplier,
            retain_source_column: self.retain_source_column.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_super_trend_params(self.lookback_periods, self.multiplier)?;
        if self.recent_n == 0 {
            return Err(AppError::InvalidInput("recent_n must be at least 1".to_string()));
        }
        Ok(())
    }
}

pub fn validate_super_trend_params(lookback_periods: usize, multiplier: f64) -> Result<()> {
    if lookback_periods == 0 {
        return Err(AppError::InvalidInput("lookback_periods must be at least 1".to_string()));
    }
    if !(multiplier.is_finite() && multiplier > 0.0) {
        return Err(AppError::InvalidInput("multiplier must be a positive number".to_string()));
    }
    Ok(())
}

/// `"close, open"` -> `["close", "open"]`. `None` keeps the indicator default.
pub fn parse_column_list(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|s| {
        s.split(',')
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect()
    })
}
