//! Seasonal ARIMA models
//!
//! A model `SARIMA(p,d,q)(P,D,Q,s)` is written on the undifferenced series as
//!
//! ```text
//! phi(L) Phi(L^s) (1-L)^d (1-L^s)^D y_t = theta(L) Theta(L^s) e_t
//! ```
//!
//! with no trend term. Coefficients are estimated by conditional sum of
//! squares: the first `d + s*D + p + s*P` observations are conditioned on and
//! pre-sample innovations are zero. The optimizer works on unconstrained
//! values mapped through the partial-autocorrelation transform, so every
//! fitted model is stationary and invertible.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, SeriesForecast, TrainedForecastModel};
use cashflow_math::polynomial::{constrain_stationary, psi_weights};
use cashflow_math::{LagPolynomial, NelderMead};
use std::f64::consts::PI;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Optimizer iteration cap used unless configured otherwise
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Lower bound on the innovation variance; keeps the likelihood finite for
/// series a model reproduces exactly
const VARIANCE_FLOOR: f64 = 1e-8;

/// Non-seasonal order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    pub fn is_zero(&self) -> bool {
        self.p == 0 && self.d == 0 && self.q == 0
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Seasonal order `(P, D, Q, period)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub const fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.p, self.d, self.q, self.period)
    }
}

/// Reason a configuration could not be fitted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitFailure {
    #[error("series is empty")]
    EmptySeries,

    #[error("need at least {required} observations, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("objective is not finite at the optimum")]
    NonFinite,

    #[error("search deadline passed before the fit started")]
    TimedOut,

    #[error("optimizer failed: {0}")]
    Optimizer(String),
}

impl From<FitFailure> for ForecastError {
    fn from(failure: FitFailure) -> Self {
        ForecastError::ModelFitError(failure.to_string())
    }
}

/// Result of fitting one configuration
#[derive(Debug, Clone)]
pub enum FitOutcome {
    Success(ModelFit),
    Failure(FitFailure),
}

impl FitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FitOutcome::Success(_))
    }

    /// The fit, discarding the failure reason
    pub fn success(self) -> Option<ModelFit> {
        match self {
            FitOutcome::Success(fit) => Some(fit),
            FitOutcome::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<ModelFit> {
        match self {
            FitOutcome::Success(fit) => Ok(fit),
            FitOutcome::Failure(reason) => Err(reason.into()),
        }
    }
}

/// Estimated coefficients, one vector per polynomial
#[derive(Debug, Clone, PartialEq, Default)]
struct Coefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

/// Unfitted seasonal ARIMA specification
#[derive(Debug, Clone, PartialEq)]
pub struct Sarima {
    name: String,
    order: ArimaOrder,
    seasonal: SeasonalOrder,
    max_iterations: usize,
}

impl Sarima {
    pub fn new(order: ArimaOrder, seasonal: SeasonalOrder) -> Self {
        Self {
            name: format!("SARIMA{}{}", order, seasonal),
            order,
            seasonal,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set the optimizer iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Number of estimated ARMA coefficients
    fn parameter_count(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// Observations consumed before the first innovation can be computed
    fn conditioning_lags(&self) -> usize {
        let s = self.seasonal.period;
        self.order.d + s * self.seasonal.d + self.order.p + s * self.seasonal.p
    }

    /// Map an unconstrained parameter vector to stationary/invertible coefficients
    fn coefficients(&self, unconstrained: &[f64]) -> Coefficients {
        let (ar, rest) = unconstrained.split_at(self.order.p);
        let (ma, rest) = rest.split_at(self.order.q);
        let (seasonal_ar, seasonal_ma) = rest.split_at(self.seasonal.p);

        let invertible =
            |x: &[f64]| -> Vec<f64> { constrain_stationary(x).into_iter().map(|c| -c).collect() };

        Coefficients {
            ar: constrain_stationary(ar),
            ma: invertible(ma),
            seasonal_ar: constrain_stationary(seasonal_ar),
            seasonal_ma: invertible(seasonal_ma),
        }
    }

    fn zero_coefficients(&self) -> Coefficients {
        Coefficients {
            ar: vec![0.0; self.order.p],
            ma: vec![0.0; self.order.q],
            seasonal_ar: vec![0.0; self.seasonal.p],
            seasonal_ma: vec![0.0; self.seasonal.q],
        }
    }

    /// Full autoregressive (with differencing) and moving-average polynomials
    fn polynomials(&self, c: &Coefficients) -> (LagPolynomial, LagPolynomial) {
        let s = self.seasonal.period;
        let ar = &(&LagPolynomial::autoregressive(&c.ar, 1)
            * &LagPolynomial::autoregressive(&c.seasonal_ar, s))
            * &LagPolynomial::differencing(self.order.d, self.seasonal.d, s);
        let ma = &LagPolynomial::moving_average(&c.ma, 1)
            * &LagPolynomial::moving_average(&c.seasonal_ma, s);
        (ar, ma)
    }

    /// Fit the configuration to `series`
    pub fn fit(&self, series: &[f64]) -> FitOutcome {
        if series.is_empty() {
            return FitOutcome::Failure(FitFailure::EmptySeries);
        }

        let required = self.conditioning_lags() + self.parameter_count() + 1;
        if series.len() < required {
            return FitOutcome::Failure(FitFailure::InsufficientData {
                required,
                available: series.len(),
            });
        }

        let optimizer = match NelderMead::new(self.max_iterations) {
            Ok(optimizer) => optimizer,
            Err(err) => return FitOutcome::Failure(FitFailure::Optimizer(err.to_string())),
        };

        let objective = |x: &[f64]| {
            let (ar, ma) = self.polynomials(&self.coefficients(x));
            sum_of_squares(&innovations(series, &ar, &ma))
        };

        let minimum = match optimizer.minimize(objective, &vec![0.0; self.parameter_count()]) {
            Ok(minimum) => minimum,
            Err(err) => return FitOutcome::Failure(FitFailure::Optimizer(err.to_string())),
        };
        if !minimum.value.is_finite() {
            return FitOutcome::Failure(FitFailure::NonFinite);
        }

        let fit = self.build(
            series,
            self.coefficients(&minimum.point),
            minimum.converged,
            minimum.iterations,
            false,
        );
        if fit.aic.is_finite() {
            FitOutcome::Success(fit)
        } else {
            FitOutcome::Failure(FitFailure::NonFinite)
        }
    }

    /// Fit the configuration, falling back to zero coefficients when it cannot be estimated.
    ///
    /// The zero-coefficient model is pure differencing; with fewer observations
    /// than the differencing needs, pre-sample values repeat the first
    /// observation. Only an empty series is an error.
    pub fn fit_or_degenerate(&self, series: &[f64]) -> Result<ModelFit> {
        match self.fit(series) {
            FitOutcome::Success(fit) => Ok(fit),
            FitOutcome::Failure(FitFailure::EmptySeries) => Err(ForecastError::ModelFitError(
                format!("cannot fit {} to an empty series", self.name),
            )),
            FitOutcome::Failure(reason) => {
                warn!(model = %self.name, %reason, "using zero-coefficient model");
                Ok(self.build(series, self.zero_coefficients(), false, 0, true))
            }
        }
    }

    fn build(
        &self,
        series: &[f64],
        coefficients: Coefficients,
        converged: bool,
        iterations: usize,
        degenerate: bool,
    ) -> ModelFit {
        let (ar_polynomial, ma_polynomial) = self.polynomials(&coefficients);
        let residuals = innovations(series, &ar_polynomial, &ma_polynomial);

        let (sigma2, aic) = if residuals.is_empty() {
            (0.0, f64::INFINITY)
        } else {
            let n = residuals.len() as f64;
            let sigma2 = (sum_of_squares(&residuals) / n).max(VARIANCE_FLOOR);
            let log_likelihood = -0.5 * n * ((2.0 * PI * sigma2).ln() + 1.0);
            let estimated = (self.parameter_count() + 1) as f64;
            (sigma2, -2.0 * log_likelihood + 2.0 * estimated)
        };

        ModelFit {
            name: self.name.clone(),
            order: self.order,
            seasonal: self.seasonal,
            coefficients,
            ar_polynomial,
            ma_polynomial,
            sigma2,
            aic,
            residuals,
            history: series.to_vec(),
            converged,
            iterations,
            degenerate,
        }
    }
}

impl ForecastModel for Sarima {
    type Trained = ModelFit;

    fn train(&self, series: &[f64]) -> Result<ModelFit> {
        self.fit(series).into_result()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fitted seasonal ARIMA model
#[derive(Debug, Clone)]
pub struct ModelFit {
    name: String,
    order: ArimaOrder,
    seasonal: SeasonalOrder,
    coefficients: Coefficients,
    ar_polynomial: LagPolynomial,
    ma_polynomial: LagPolynomial,
    sigma2: f64,
    aic: f64,
    residuals: Vec<f64>,
    history: Vec<f64>,
    converged: bool,
    iterations: usize,
    degenerate: bool,
}

impl ModelFit {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal
    }

    /// Akaike information criterion, lower is better
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ma
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the coefficients were zeroed because estimation failed
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Point forecasts and standard errors for the next `horizons` steps
    fn project(&self, horizons: usize) -> Result<SeriesForecast> {
        let Some(&first) = self.history.first() else {
            return Err(ForecastError::ModelFitError(
                "model has no history to forecast from".to_string(),
            ));
        };

        let n = self.history.len();
        let start = self.ar_polynomial.degree();
        let mut values = self.history.clone();
        let mut shocks: Vec<f64> = (0..n)
            .map(|t| if t >= start { self.residuals[t - start] } else { 0.0 })
            .collect();

        for _ in 0..horizons {
            let t = values.len();
            let mut next = 0.0;
            for i in 1..=self.ar_polynomial.degree() {
                let past = if i > t { first } else { values[t - i] };
                next -= self.ar_polynomial.coefficient(i) * past;
            }
            for j in 1..=self.ma_polynomial.degree().min(t) {
                next += self.ma_polynomial.coefficient(j) * shocks[t - j];
            }
            values.push(next);
            shocks.push(0.0);
        }

        let mut cumulative = 0.0;
        let std_errors = psi_weights(&self.ar_polynomial, &self.ma_polynomial, horizons)
            .into_iter()
            .map(|psi| {
                cumulative += psi * psi;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        SeriesForecast::with_std_errors(values.split_off(n), std_errors)
    }
}

impl TrainedForecastModel for ModelFit {
    fn forecast(&self, horizons: usize) -> Result<SeriesForecast> {
        self.project(horizons)
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn information_criterion(&self) -> f64 {
        self.aic
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One-step innovations `e_t` for `t >= ar.degree()`
fn innovations(series: &[f64], ar: &LagPolynomial, ma: &LagPolynomial) -> Vec<f64> {
    let start = ar.degree();
    let mut residuals: Vec<f64> = Vec::with_capacity(series.len().saturating_sub(start));

    for t in start..series.len() {
        let k = t - start;
        let mut e: f64 = (0..=start).map(|i| ar.coefficient(i) * series[t - i]).sum();
        for j in 1..=ma.degree().min(k) {
            e -= ma.coefficient(j) * residuals[k - j];
        }
        residuals.push(e);
    }

    residuals
}

fn sum_of_squares(values: &[f64]) -> f64 {
    let total: f64 = values.iter().map(|v| v * v).sum();
    if total.is_finite() {
        total
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cashflow_math::polynomial::is_stationary;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn simulate_ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut series = Vec::with_capacity(n);
        let mut previous = 0.0;
        for _ in 0..n {
            previous = phi * previous + noise.sample(&mut rng);
            series.push(previous);
        }
        series
    }

    #[test]
    fn test_model_names() {
        let model = Sarima::new(ArimaOrder::new(1, 1, 1), SeasonalOrder::new(0, 1, 1, 12));
        assert_eq!(model.name(), "SARIMA(1,1,1)(0,1,1,12)");
        assert_eq!(model.max_iterations(), DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn test_ar1_estimate() {
        let series = simulate_ar1(0.6, 300, 7);
        let model = Sarima::new(ArimaOrder::new(1, 0, 0), SeasonalOrder::new(0, 0, 0, 12))
            .with_max_iterations(200);
        let fit = model.train(&series).unwrap();

        assert_abs_diff_eq!(fit.ar_coefficients()[0], 0.6, epsilon = 0.15);
        assert!(fit.aic().is_finite());
        assert_eq!(fit.residuals().len(), series.len() - 1);
    }

    #[test]
    fn test_fitted_polynomials_are_stationary() {
        let series = simulate_ar1(0.9, 120, 11);
        let model = Sarima::new(ArimaOrder::new(2, 0, 2), SeasonalOrder::new(1, 0, 1, 12));
        let fit = model.train(&series).unwrap();

        assert!(is_stationary(fit.ar_coefficients()));
        assert!(is_stationary(fit.seasonal_ar_coefficients()));
        let negated_ma: Vec<f64> = fit.ma_coefficients().iter().map(|c| -c).collect();
        assert!(is_stationary(&negated_ma));
    }

    #[test]
    fn test_random_walk_forecast() {
        let series = vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 5.0, 8.0];
        let model = Sarima::new(ArimaOrder::new(0, 1, 0), SeasonalOrder::new(0, 0, 0, 12));
        let fit = model.train(&series).unwrap();
        let forecast = fit.forecast(4).unwrap();

        for value in forecast.values() {
            assert_abs_diff_eq!(*value, 8.0, epsilon = 1e-12);
        }

        let sigma = fit.sigma2().sqrt();
        let std_errors = forecast.std_errors().unwrap();
        for (h, se) in std_errors.iter().enumerate() {
            assert_abs_diff_eq!(*se, sigma * ((h + 1) as f64).sqrt(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_constant_series_with_seasonal_difference() {
        let series = vec![1_000.0; 24];
        let model = Sarima::new(ArimaOrder::new(0, 0, 1), SeasonalOrder::new(0, 1, 0, 12));
        let fit = model.train(&series).unwrap();

        assert!(fit.residuals().iter().all(|e| *e == 0.0));
        let forecast = fit.forecast(12).unwrap();
        for value in forecast.values() {
            assert_abs_diff_eq!(*value, 1_000.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_failures() {
        let model = Sarima::new(ArimaOrder::new(1, 0, 0), SeasonalOrder::new(1, 1, 0, 12));
        assert!(matches!(model.fit(&[]), FitOutcome::Failure(FitFailure::EmptySeries)));

        match model.fit(&[1.0; 10]) {
            FitOutcome::Failure(FitFailure::InsufficientData { required, available }) => {
                assert_eq!(required, 28);
                assert_eq!(available, 10);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }

        let err = model.train(&[1.0; 10]).unwrap_err();
        assert!(matches!(err, ForecastError::ModelFitError(_)));
    }

    #[test]
    fn test_degenerate_single_point() {
        let model = Sarima::new(ArimaOrder::new(1, 1, 1), SeasonalOrder::new(1, 1, 1, 12));
        let fit = model.fit_or_degenerate(&[420.0]).unwrap();

        assert!(fit.is_degenerate());
        assert!(fit.residuals().is_empty());
        let forecast = fit.forecast(12).unwrap();
        assert_eq!(forecast.horizons(), 12);
        assert!(forecast.values().iter().all(|v| *v == 420.0));

        assert!(model.fit_or_degenerate(&[]).is_err());
    }
}
