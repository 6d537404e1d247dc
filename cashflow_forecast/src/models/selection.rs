//! Grid search over seasonal ARIMA configurations
//!
//! Candidates are enumerated up front in a fixed order and reduced by a fold
//! that keeps the lowest AIC. Configurations that cannot be fitted are
//! skipped; when none can, a fixed fallback model is fitted instead.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::sarima::{
    ArimaOrder, FitFailure, FitOutcome, ModelFit, Sarima, SeasonalOrder, DEFAULT_MAX_ITERATIONS,
};
use crate::models::{ForecastModel, TrainedForecastModel};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Values each non-seasonal order component ranges over
const ORDER_RANGE: [usize; 3] = [0, 1, 2];
/// Values the seasonal AR and MA components range over
const SEASONAL_RANGE: [usize; 2] = [0, 1];

/// Keep the item with the lowest score; on equal scores the earliest wins.
///
/// Items whose score is NaN never win.
pub fn best_by_score<T, I, F>(items: I, score: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> f64,
{
    items
        .into_iter()
        .map(|item| {
            let value = score(&item);
            (item, value)
        })
        .filter(|(_, value)| !value.is_nan())
        .fold(None, |best: Option<(T, f64)>, (item, value)| match best {
            Some((kept, kept_value)) if kept_value <= value => Some((kept, kept_value)),
            _ => Some((item, value)),
        })
        .map(|(item, _)| item)
}

/// Lowest-AIC successful fit among `outcomes`
pub fn best_fit<I>(outcomes: I) -> Option<ModelFit>
where
    I: IntoIterator<Item = FitOutcome>,
{
    best_by_score(outcomes.into_iter().filter_map(FitOutcome::success), |fit| {
        fit.aic()
    })
}

/// Model chosen for one series
#[derive(Debug, Clone)]
pub struct Selection {
    pub fit: ModelFit,
    /// Whether every candidate failed and the fallback model was used
    pub used_fallback: bool,
    /// Number of candidates in the grid
    pub evaluated: usize,
    /// Number of candidates that could not be fitted
    pub failed: usize,
}

/// Seasonal ARIMA grid search
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelector {
    period: usize,
    max_iterations: usize,
    seasonal_diff_threshold: f64,
    timeout: Option<Duration>,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self {
            period: 12,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seasonal_diff_threshold: 0.01,
            timeout: None,
        }
    }
}

impl ModelSelector {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            period: config.seasonal_period,
            max_iterations: config.max_iterations,
            seasonal_diff_threshold: config.seasonal_diff_threshold,
            timeout: config.search_timeout(),
        }
    }

    /// Bound the wall-clock time of one search
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Seasonal differencing orders worth searching for `series`.
    ///
    /// Both 0 and 1 when the mean absolute first difference exceeds the
    /// threshold fraction of the mean absolute value, otherwise only 1.
    pub fn seasonal_differencing_options(&self, series: &[f64]) -> Vec<usize> {
        if series.len() < 2 {
            return vec![1];
        }

        let mean_abs = series.iter().map(|v| v.abs()).sum::<f64>() / series.len() as f64;
        let mean_abs_diff = series.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>()
            / (series.len() - 1) as f64;

        if mean_abs_diff > self.seasonal_diff_threshold * mean_abs {
            vec![0, 1]
        } else {
            vec![1]
        }
    }

    /// Every configuration searched for `series`, in evaluation order
    pub fn candidates(&self, series: &[f64]) -> Vec<Sarima> {
        let seasonal_d = self.seasonal_differencing_options(series);

        let orders = ORDER_RANGE.iter().flat_map(|&p| {
            ORDER_RANGE
                .iter()
                .flat_map(move |&d| ORDER_RANGE.iter().map(move |&q| ArimaOrder::new(p, d, q)))
        });

        orders
            .filter(|order| !order.is_zero())
            .flat_map(|order| {
                let seasonal_d = &seasonal_d;
                SEASONAL_RANGE.iter().flat_map(move |&sp| {
                    seasonal_d.iter().flat_map(move |&sd| {
                        SEASONAL_RANGE.iter().map(move |&sq| {
                            Sarima::new(order, SeasonalOrder::new(sp, sd, sq, self.period))
                                .with_max_iterations(self.max_iterations)
                        })
                    })
                })
            })
            .collect()
    }

    /// Model used when no candidate can be fitted
    pub fn fallback_model(&self) -> Sarima {
        Sarima::new(
            ArimaOrder::new(1, 1, 1),
            SeasonalOrder::new(1, 1, 1, self.period),
        )
        .with_max_iterations(self.max_iterations)
    }

    /// Pick the lowest-AIC model for `series`.
    ///
    /// Never fails for a non-empty series.
    #[instrument(skip(self, series), fields(len = series.len(), period = self.period))]
    pub fn select(&self, series: &[f64]) -> Result<Selection> {
        if series.is_empty() {
            return Err(ForecastError::InputError(
                "cannot select a model for an empty series".to_string(),
            ));
        }

        let candidates = self.candidates(series);
        let evaluated = candidates.len();
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let mut failed = 0;

        let outcomes = candidates.iter().map(|model| {
            let outcome = match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    FitOutcome::Failure(FitFailure::TimedOut)
                }
                _ => model.fit(series),
            };
            match &outcome {
                FitOutcome::Success(fit) => {
                    debug!(model = model.name(), aic = fit.aic(), "candidate fitted")
                }
                FitOutcome::Failure(reason) => {
                    failed += 1;
                    debug!(model = model.name(), %reason, "candidate skipped")
                }
            }
            outcome
        });
        let best = best_fit(outcomes);

        match best {
            Some(fit) => {
                info!(
                    model = fit.name(),
                    aic = fit.aic(),
                    evaluated,
                    failed,
                    "selected model"
                );
                Ok(Selection {
                    fit,
                    used_fallback: false,
                    evaluated,
                    failed,
                })
            }
            None => {
                let fallback = self.fallback_model();
                warn!(model = fallback.name(), evaluated, "no candidate fitted, using fallback");
                Ok(Selection {
                    fit: fallback.fit_or_degenerate(series)?,
                    used_fallback: true,
                    evaluated,
                    failed,
                })
            }
        }
    }
}
