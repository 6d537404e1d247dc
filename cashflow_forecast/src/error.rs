//! Error types for the cashflow_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the cashflow_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Missing or unparseable date column, empty or malformed tabular input
    #[error("Input error: {0}")]
    InputError(String),

    /// A model could not be fitted to a series
    #[error("Model fit error: {0}")]
    ModelFitError(String),

    /// Confidence could not be derived from a fitted model
    #[error("Scoring error: {0}")]
    ScoringError(String),

    /// Invalid configuration values or an unreadable configuration file
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error while writing CSV output
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<cashflow_math::MathError> for ForecastError {
    fn from(err: cashflow_math::MathError) -> Self {
        ForecastError::ModelFitError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl ForecastError {
    /// Prefix the message with where the error happened, keeping the variant
    pub fn context<C: std::fmt::Display>(self, context: C) -> Self {
        match self {
            ForecastError::InputError(msg) => ForecastError::InputError(format!("{}: {}", context, msg)),
            ForecastError::ModelFitError(msg) => {
                ForecastError::ModelFitError(format!("{}: {}", context, msg))
            }
            ForecastError::ScoringError(msg) => {
                ForecastError::ScoringError(format!("{}: {}", context, msg))
            }
            ForecastError::ConfigError(msg) => ForecastError::ConfigError(format!("{}: {}", context, msg)),
            ForecastError::PolarsError(msg) => ForecastError::PolarsError(format!("{}: {}", context, msg)),
            ForecastError::CsvError(msg) => ForecastError::CsvError(format!("{}: {}", context, msg)),
            ForecastError::IoError(err) => {
                ForecastError::IoError(std::io::Error::new(err.kind(), format!("{}: {}", context, err)))
            }
        }
    }
}
