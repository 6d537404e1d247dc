//! Engine configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! seasonal_period = 12
//! max_iterations = 50
//! search_timeout_secs = 20.0
//! ```

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable constants of the forecasting pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Steps in one seasonal cycle (12 for monthly data)
    pub seasonal_period: usize,
    /// Optimizer iteration cap per candidate fit
    pub max_iterations: usize,
    /// Ratio of mean absolute first difference to mean absolute value above
    /// which seasonal differencing 0 is also searched
    pub seasonal_diff_threshold: f64,
    /// Wall-clock budget for one grid search, unbounded when absent
    pub search_timeout_secs: Option<f64>,
    /// Percent change beyond which a trend is reported as increase/decrease
    pub trend_threshold_pct: f64,
    /// Forecast/historical expense ratio that triggers a warning
    pub expense_warning_ratio: f64,
    /// Forecast/historical income ratio below which a warning is raised
    pub income_warning_ratio: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            seasonal_period: 12,
            max_iterations: 50,
            seasonal_diff_threshold: 0.01,
            search_timeout_secs: None,
            trend_threshold_pct: 5.0,
            expense_warning_ratio: 1.2,
            income_warning_ratio: 0.8,
        }
    }
}

impl ForecastConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ForecastConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_secs.map(Duration::from_secs_f64)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.seasonal_period < 2 {
            return Err(ForecastError::ConfigError(format!(
                "seasonal_period must be at least 2, got {}",
                self.seasonal_period
            )));
        }
        if self.max_iterations == 0 {
            return Err(ForecastError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.seasonal_diff_threshold.is_finite() && self.seasonal_diff_threshold >= 0.0) {
            return Err(ForecastError::ConfigError(
                "seasonal_diff_threshold must be a non-negative number".to_string(),
            ));
        }
        if let Some(secs) = self.search_timeout_secs {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(ForecastError::ConfigError(
                    "search_timeout_secs must be a positive number".to_string(),
                ));
            }
        }
        if !(self.trend_threshold_pct.is_finite() && self.trend_threshold_pct >= 0.0) {
            return Err(ForecastError::ConfigError(
                "trend_threshold_pct must be a non-negative number".to_string(),
            ));
        }
        for (name, ratio) in [
            ("expense_warning_ratio", self.expense_warning_ratio),
            ("income_warning_ratio", self.income_warning_ratio),
        ] {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(ForecastError::ConfigError(format!(
                    "{} must be a positive number",
                    name
                )));
            }
        }
        Ok(())
    }
}
