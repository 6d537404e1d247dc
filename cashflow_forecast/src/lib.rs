//! # Cashflow Forecast
//!
//! Monthly income, expense and savings forecasting from daily business
//! transaction records.
//!
//! ## Features
//!
//! - Daily rows read from a CSV file, CSV text or an in-memory table
//! - Daily-to-monthly aggregation into income and expense series
//! - Seasonal ARIMA model selection by AIC with a guaranteed fallback
//! - Heuristic confidence scores in `[0.05, 0.99]`
//! - Trend and threshold insights comparing forecasts with history
//!
//! ## Quick Start
//!
//! ```no_run
//! use cashflow_forecast::data::CsvPath;
//! use cashflow_forecast::forecaster::Forecaster;
//! use cashflow_forecast::config::ForecastConfig;
//!
//! # fn main() -> Result<(), cashflow_forecast::ForecastError> {
//! let forecaster = Forecaster::new(ForecastConfig::default())?;
//! let result = forecaster.forecast_next_12_months(&CsvPath::new("transactions.csv"))?;
//!
//! for month in &result.monthly_predictions {
//!     println!("{}: {} saved", month.month, month.savings);
//! }
//! println!("confidence {}", result.summary.confidence);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod confidence;
pub mod config;
pub mod data;
pub mod error;
pub mod forecaster;
pub mod insights;
pub mod models;
pub mod transactions;

// Re-export commonly used types
pub use crate::aggregation::{MonthlySeries, YearMonth};
pub use crate::config::ForecastConfig;
pub use crate::data::{Category, CsvPath, CsvText, RawRecord, TabularSource};
pub use crate::error::{ForecastError, Result};
pub use crate::forecaster::{
    forecast_next_12_months, forecast_next_month, forecast_next_year, Forecaster,
    MonthlyForecast, NextMonthForecast, YearlyForecast,
};
pub use crate::insights::{Insight, InsightKind};
pub use crate::models::{ModelSelector, Sarima};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
