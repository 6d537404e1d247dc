//! Cashflow forecast CLI
//!
//! Usage:
//!   cashflow_forecast monthly data.csv       Next 12 months, month by month
//!   cashflow_forecast yearly data.csv        Totals over the next 12 months
//!   cashflow_forecast next-month data.csv    The month after the last observed one

use anyhow::{Context, Result};
use cashflow_forecast::{CsvPath, ForecastConfig, Forecaster};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cashflow_forecast")]
#[command(about = "Forecast monthly income, expenses and savings from daily records")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast each of the next 12 months
    Monthly {
        /// CSV file with a date column and one column per category
        file: PathBuf,
    },
    /// Forecast totals over the next 12 months
    Yearly {
        /// CSV file with a date column and one column per category
        file: PathBuf,
    },
    /// Forecast the month after the last observed one
    NextMonth {
        /// CSV file with a date column and one column per category
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    let config = match &cli.config {
        Some(path) => ForecastConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ForecastConfig::default(),
    };
    let forecaster = Forecaster::new(config)?;

    let output = match &cli.command {
        Commands::Monthly { file } => {
            let result = forecaster
                .forecast_next_12_months(&CsvPath::new(file))
                .with_context(|| format!("Failed to forecast {}", file.display()))?;
            serde_json::to_string_pretty(&result)?
        }
        Commands::Yearly { file } => {
            let result = forecaster
                .forecast_next_year(&CsvPath::new(file))
                .with_context(|| format!("Failed to forecast {}", file.display()))?;
            serde_json::to_string_pretty(&result)?
        }
        Commands::NextMonth { file } => {
            let result = forecaster
                .forecast_next_month(&CsvPath::new(file))
                .with_context(|| format!("Failed to forecast {}", file.display()))?;
            serde_json::to_string_pretty(&result)?
        }
    };

    println!("{}", output);
    Ok(())
}
