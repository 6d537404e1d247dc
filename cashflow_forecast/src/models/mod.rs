//! Forecasting models for monthly series

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

/// Point forecast with optional per-step standard errors
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesForecast {
    /// Forecasted values
    values: Vec<f64>,
    /// Standard error of each forecasted value (optional)
    std_errors: Option<Vec<f64>>,
}

impl SeriesForecast {
    /// Create a forecast without uncertainty information
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            std_errors: None,
        }
    }

    /// Create a forecast with one standard error per value
    pub fn with_std_errors(values: Vec<f64>, std_errors: Vec<f64>) -> Result<Self> {
        if values.len() != std_errors.len() {
            return Err(ForecastError::ModelFitError(format!(
                "Values length ({}) doesn't match standard errors length ({})",
                values.len(),
                std_errors.len()
            )));
        }

        Ok(Self {
            values,
            std_errors: Some(std_errors),
        })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the standard errors, if available
    pub fn std_errors(&self) -> Option<&[f64]> {
        self.std_errors.as_deref()
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.values.len()
    }

    /// Sum of the forecasted values
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Fitted model able to project a series forward
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<SeriesForecast>;

    /// In-sample one-step errors of the fit
    fn residuals(&self) -> &[f64];

    /// Fit quality, lower is better
    fn information_criterion(&self) -> f64;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Model specification that can be fitted to a series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Fit the model to a chronologically ordered series
    fn train(&self, series: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod sarima;
pub mod selection;

pub use sarima::{ArimaOrder, FitFailure, FitOutcome, ModelFit, Sarima, SeasonalOrder};
pub use selection::{best_by_score, best_fit, ModelSelector, Selection};
