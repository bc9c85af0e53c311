//! Runtime settings read from the environment (and `.env` when present)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::{AppError, Result};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3030";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_TICKERS_CSV: &str = "tickers_nse.csv";

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub provider_base_url: String,
    pub provider_timeout: Duration,
    pub batch_size: usize,
    pub tickers_csv: PathBuf,
    database: DatabaseSettings,
}

#[derive(Debug, Clone, Default)]
struct DatabaseSettings {
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
    host: String,
    port: u16,
    name: String,
}

impl Settings {
    /// Load `.env` (if any) and build settings from the process environment
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR: {}", e)))?;

        let provider_base_url = lookup("PROVIDER_BASE_URL")
            .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !provider_base_url.starts_with("http://") && !provider_base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "PROVIDER_BASE_URL must start with http:// or https://, got: '{}'",
                provider_base_url
            )));
        }

        let provider_timeout = Duration::from_secs(parse_or(&lookup, "PROVIDER_TIMEOUT_SECS", 30)?);
        let batch_size = parse_or(&lookup, "BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(AppError::Config("BATCH_SIZE must be at least 1".to_string()));
        }

        let tickers_csv = PathBuf::from(
            lookup("TICKERS_CSV").unwrap_or_else(|| DEFAULT_TICKERS_CSV.to_string()),
        );

        let database = DatabaseSettings {
            url: lookup("DATABASE_URL"),
            user: lookup("USER"),
            password: lookup("PASSWORD"),
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_or(&lookup, "DB_PORT", 5432)?,
            name: lookup("DB_NAME").unwrap_or_else(|| "playground".to_string()),
        };

        Ok(Self {
            bind_addr,
            provider_base_url,
            provider_timeout,
            batch_size,
            tickers_csv,
            database,
        })
    }

    /// Postgres connection string. Only commands touching the store need it.
    pub fn database_url(&self) -> Result<String> {
        let db = &self.database;
        if let Some(url) = &db.url {
            return Ok(url.clone());
        }
        match (&db.user, &db.password) {
            (Some(user), Some(password)) => Ok(format!(
                "postgresql://{}:{}@{}:{}/{}",
                user, password, db.host, db.port, db.name
            )),
            _ => Err(AppError::Config(
                "set DATABASE_URL or both USER and PASSWORD".to_string(),
            )),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{}: {}", key, e))),
        None => Ok(default),
    }
}
