//! Batch jobs for the ticker history store
//!
//! Run: cargo run --release --bin pipeline -- setup-db
//!      cargo run --release --bin pipeline -- insert --tickers-csv tickers_nse.csv
//!      cargo run --release --bin pipeline -- show --ticker infy

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use factor_investing::db::{HistoryStore, RowSelection};
use factor_investing::pipeline::{insert_history, read_tickers};
use factor_investing::provider::{SharedProvider, YahooFinance};
use factor_investing::{AppError, Result, Settings, StockExchange};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "pipeline")]
#[command(about = "Factor Investing history pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema, table and index
    SetupDb,
    /// Download daily history and append it to the store
    Insert {
        /// CSV whose first column lists ticker symbols (defaults to TICKERS_CSV)
        #[arg(short, long)]
        tickers_csv: Option<PathBuf>,
        /// Exchange the tickers are listed on
        #[arg(short, long, default_value = "nse")]
        exchange: StockExchange,
        /// Tickers per download batch (defaults to BATCH_SIZE)
        #[arg(short, long)]
        batch_size: Option<usize>,
    },
    /// Print stored rows as JSON lines (latest date when no filter is given)
    Show {
        /// One ticker's full history
        #[arg(short, long, conflicts_with = "date")]
        ticker: Option<String>,
        /// Every ticker on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("pipeline failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;
    let store = HistoryStore::connect(&settings.database_url()?).await?;

    match cli.command {
        Commands::SetupDb => {
            store.setup().await?;
            info!("database setup finished");
        }
        Commands::Insert {
            tickers_csv,
            exchange,
            batch_size,
        } => {
            let path = tickers_csv.unwrap_or_else(|| settings.tickers_csv.clone());
            let tickers = read_tickers(&path)?;
            info!("loaded {} tickers from {}", tickers.len(), path.display());

            let provider: SharedProvider = Arc::new(YahooFinance::new(
                &settings.provider_base_url,
                settings.provider_timeout,
            )?);
            let summary = insert_history(
                &store,
                provider,
                &tickers,
                exchange,
                batch_size.unwrap_or(settings.batch_size),
                Local::now().date_naive(),
            )
            .await?;
            info!(
                "inserted {} rows over {} batches, skipped {} tickers",
                summary.inserted,
                summary.batches,
                summary.skipped.len()
            );
        }
        Commands::Show { ticker, date } => {
            let selection = match (ticker, date) {
                (Some(ticker), _) => RowSelection::for_ticker(&ticker),
                (None, Some(date)) => RowSelection::OnDate(date),
                (None, None) => RowSelection::Latest,
            };
            let rows = store.select(&selection).await?;
            info!("{} rows", rows.len());
            for row in &rows {
                let line = serde_json::to_string(row)
                    .map_err(|e| AppError::Io(format!("failed to encode row: {}", e)))?;
                println!("{}", line);
            }
        }
    }
    Ok(())
}
