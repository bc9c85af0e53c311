// src/db/sql.rs
// DDL and queries for the price history store

pub const SCHEMA_NAME: &str = "factor_investing";
pub const TICKER_HISTORY_TABLE: &str = "factor_investing.ticker_history";

pub const SCHEMA_DDL: &str = "CREATE SCHEMA IF NOT EXISTS factor_investing";

pub const TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS factor_investing.ticker_history (
        key TEXT PRIMARY KEY,
        date DATE NOT NULL,
        ticker TEXT NOT NULL,
        open DOUBLE PRECISION NOT NULL,
        high DOUBLE PRECISION NOT NULL,
        low DOUBLE PRECISION NOT NULL,
        close DOUBLE PRECISION NOT NULL
    )
"#;

pub const INDEX_DDL: &str =
    "CREATE INDEX IF NOT EXISTS idx_ticker_history_ticker_date ON factor_investing.ticker_history (ticker, date)";

const COLUMNS: &str = "key, date, ticker, open, high, low, close";

/// Rows stored on the most recent date
pub fn latest_data_query() -> String {
    format!(
        "SELECT {cols} FROM {t} WHERE date = (SELECT MAX(date) FROM {t})",
        cols = COLUMNS,
        t = TICKER_HISTORY_TABLE
    )
}

pub fn latest_date_query() -> String {
    format!("SELECT MAX(date) FROM {}", TICKER_HISTORY_TABLE)
}

/// Binds: `$1` date
pub fn specific_date_query() -> String {
    format!(
        "SELECT {} FROM {} WHERE date = $1 ORDER BY ticker",
        COLUMNS, TICKER_HISTORY_TABLE
    )
}

/// Binds: `$1` ticker
pub fn ticker_history_query() -> String {
    format!(
        "SELECT {} FROM {} WHERE ticker = $1 ORDER BY date",
        COLUMNS, TICKER_HISTORY_TABLE
    )
}

pub fn insert_prefix() -> String {
    format!("INSERT INTO {} ({}) ", TICKER_HISTORY_TABLE, COLUMNS)
}

pub const INSERT_CONFLICT: &str = " ON CONFLICT (key) DO NOTHING";
