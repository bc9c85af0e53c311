//! Relational store for daily ticker history (PostgreSQL)

pub mod sql;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::frame::Candle;

/// Rows per INSERT statement (7 binds each, well under the Postgres limit)
const INSERT_CHUNK: usize = 1_000;

/// One row of `factor_investing.ticker_history`
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TickerHistoryRow {
    pub key: String,
    pub date: NaiveDate,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Primary key of a history row: lower-case ticker followed by `YYYYMMDD`
pub fn history_key(ticker: &str, date: NaiveDate) -> String {
    format!("{}{}", ticker.to_lowercase(), date.format("%Y%m%d"))
}

/// Turn downloaded bars into table rows
///
/// An empty download is an error (the provider returned nothing for the
/// ticker); incomplete bars are dropped.
pub fn prepare_ticker_history_rows(candles: &[Candle], ticker: &str) -> Result<Vec<TickerHistoryRow>> {
    if candles.is_empty() {
        return Err(AppError::provider(
            ticker,
            "got empty dataframe, may not able to download data from yahoo",
        ));
    }
    let ticker = ticker.to_uppercase();
    let rows = candles
        .iter()
        .filter_map(|c| match (c.open, c.high, c.low, c.close) {
            (Some(open), Some(high), Some(low), Some(close)) => Some(TickerHistoryRow {
                key: history_key(&ticker, c.date),
                date: c.date,
                ticker: ticker.clone(),
                open,
                high,
                low,
                close,
            }),
            _ => None,
        })
        .collect();
    Ok(rows)
}

/// Which stored rows to read back
#[derive(Debug, Clone, PartialEq)]
pub enum RowSelection {
    /// Every ticker on the most recent stored date
    Latest,
    OnDate(NaiveDate),
    /// Full history of one ticker, oldest first
    Ticker(String),
}

impl RowSelection {
    /// `ticker` is upper-cased to match stored rows
    pub fn for_ticker(ticker: &str) -> Self {
        RowSelection::Ticker(ticker.trim().to_uppercase())
    }

    pub fn sql(&self) -> String {
        match self {
            RowSelection::Latest => sql::latest_data_query(),
            RowSelection::OnDate(_) => sql::specific_date_query(),
            RowSelection::Ticker(_) => sql::ticker_history_query(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    pool: PgPool,
}

impl HistoryStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;
        info!("Connected to history store");
        Ok(Self { pool })
    }

    /// Create schema, table and index in one transaction
    pub async fn setup(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        debug!("{}", sql::SCHEMA_DDL);
        sqlx::query(sql::SCHEMA_DDL).execute(&mut *tx).await?;
        info!("Schema setup complete");
        sqlx::query(sql::TABLE_DDL).execute(&mut *tx).await?;
        sqlx::query(sql::INDEX_DDL).execute(&mut *tx).await?;
        info!("Table setup complete");
        tx.commit().await?;
        Ok(())
    }

    pub async fn latest_date(&self) -> Result<Option<NaiveDate>> {
        let date: Option<NaiveDate> = sqlx::query_scalar(&sql::latest_date_query())
            .fetch_one(&self.pool)
            .await?;
        Ok(date)
    }

    pub async fn select(&self, selection: &RowSelection) -> Result<Vec<TickerHistoryRow>> {
        let query = selection.sql();
        debug!("{}", query);
        let rows = match selection {
            RowSelection::Latest => sqlx::query_as(&query).fetch_all(&self.pool).await?,
            RowSelection::OnDate(date) => sqlx::query_as(&query).bind(*date).fetch_all(&self.pool).await?,
            RowSelection::Ticker(ticker) => sqlx::query_as(&query).bind(ticker).fetch_all(&self.pool).await?,
        };
        Ok(rows)
    }

    /// Append rows; keys already stored are left untouched. Returns rows written.
    pub async fn insert_rows(&self, rows: &[TickerHistoryRow]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(sql::insert_prefix());
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.key)
                    .push_bind(row.date)
                    .push_bind(&row.ticker)
                    .push_bind(row.open)
                    .push_bind(row.high)
                    .push_bind(row.low)
                    .push_bind(row.close);
            });
            builder.push(sql::INSERT_CONFLICT);
            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }
}
