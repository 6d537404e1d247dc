//! Heuristic confidence score for a fitted model
//!
//! Three sub-scores, each a decaying exponential of a diagnostic, are
//! combined with fixed weights and clamped:
//!
//! - fit quality: `exp(-AIC / 10000)`
//! - stability: `exp(-var(residuals) / (mean(series)^2 + eps))`
//! - uncertainty: `exp(-mean(std errors) / (mean(series) + eps))`, or 0.5
//!   when the forecast carries no standard errors
//!
//! The result is a proxy for trustworthiness, not a calibrated probability.

use crate::error::{ForecastError, Result};
use crate::models::{SeriesForecast, TrainedForecastModel};
use serde::Serialize;
use statrs::statistics::Statistics;
use tracing::warn;

pub const FIT_QUALITY_WEIGHT: f64 = 0.4;
pub const STABILITY_WEIGHT: f64 = 0.3;
pub const UNCERTAINTY_WEIGHT: f64 = 0.3;

/// Uncertainty sub-score used when standard errors are unavailable
pub const MISSING_STD_ERROR_SCORE: f64 = 0.5;

pub const MIN_CONFIDENCE: f64 = 0.05;
pub const MAX_CONFIDENCE: f64 = 0.99;

/// Returned whenever the score cannot be computed
pub const FALLBACK_CONFIDENCE: f64 = 0.7;

const EPSILON: f64 = 1e-8;
const AIC_SCALE: f64 = 10_000.0;

/// Sub-scores and their clamped weighted sum
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub fit_quality: f64,
    pub stability: f64,
    pub uncertainty: f64,
    pub combined: f64,
}

/// Compute the confidence breakdown, reporting why it could not be computed.
pub fn try_score<M>(model: &M, series: &[f64], forecast: &SeriesForecast) -> Result<ConfidenceBreakdown>
where
    M: TrainedForecastModel + ?Sized,
{
    if series.is_empty() {
        return Err(ForecastError::ScoringError("series is empty".to_string()));
    }
    let residuals = model.residuals();
    if residuals.is_empty() {
        return Err(ForecastError::ScoringError(format!(
            "{} has no residuals",
            model.name()
        )));
    }

    let level = series.iter().mean();

    let fit_quality = (-model.information_criterion() / AIC_SCALE).exp();
    let stability = (-residuals.iter().population_variance() / (level * level + EPSILON)).exp();
    let uncertainty = match forecast.std_errors() {
        Some(std_errors) => (-std_errors.iter().mean() / (level + EPSILON)).exp(),
        None => MISSING_STD_ERROR_SCORE,
    };

    for (name, value) in [
        ("fit quality", fit_quality),
        ("stability", stability),
        ("uncertainty", uncertainty),
    ] {
        if !value.is_finite() {
            return Err(ForecastError::ScoringError(format!(
                "{} sub-score is not finite for {}",
                name,
                model.name()
            )));
        }
    }

    let combined = FIT_QUALITY_WEIGHT * fit_quality
        + STABILITY_WEIGHT * stability
        + UNCERTAINTY_WEIGHT * uncertainty;

    Ok(ConfidenceBreakdown {
        fit_quality,
        stability,
        uncertainty,
        combined: combined.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
    })
}

/// Confidence in `[0.05, 0.99]`; never fails, falling back to 0.7.
pub fn score<M>(model: &M, series: &[f64], forecast: &SeriesForecast) -> f64
where
    M: TrainedForecastModel + ?Sized,
{
    match try_score(model, series, forecast) {
        Ok(breakdown) => breakdown.combined,
        Err(err) => {
            warn!(model = model.name(), error = %err, "using fallback confidence");
            FALLBACK_CONFIDENCE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Debug)]
    struct StubModel {
        residuals: Vec<f64>,
        aic: f64,
    }

    impl TrainedForecastModel for StubModel {
        fn forecast(&self, horizons: usize) -> Result<SeriesForecast> {
            Ok(SeriesForecast::new(vec![0.0; horizons]))
        }

        fn residuals(&self) -> &[f64] {
            &self.residuals
        }

        fn information_criterion(&self) -> f64 {
            self.aic
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn stub(residuals: Vec<f64>, aic: f64) -> StubModel {
        StubModel { residuals, aic }
    }

    #[test]
    fn test_weighted_combination() {
        let model = stub(vec![1.0, -1.0, 1.0, -1.0], 100.0);
        let series = [8.0, 12.0, 10.0];
        let forecast = SeriesForecast::with_std_errors(vec![10.0, 10.0], vec![2.0, 2.0]).unwrap();

        let breakdown = try_score(&model, &series, &forecast).unwrap();
        let fit = (-0.01f64).exp();
        let stability = (-1.0 / (100.0 + EPSILON)).exp();
        let uncertainty = (-2.0 / (10.0 + EPSILON)).exp();

        assert_relative_eq!(breakdown.fit_quality, fit);
        assert_relative_eq!(breakdown.stability, stability);
        assert_relative_eq!(breakdown.uncertainty, uncertainty);
        assert_relative_eq!(
            breakdown.combined,
            0.4 * fit + 0.3 * stability + 0.3 * uncertainty
        );
    }

    #[test]
    fn test_missing_std_errors_score_half() {
        let model = stub(vec![0.0, 0.0], 0.0);
        let forecast = SeriesForecast::new(vec![5.0]);

        let breakdown = try_score(&model, &[5.0, 5.0], &forecast).unwrap();
        assert_eq!(breakdown.uncertainty, MISSING_STD_ERROR_SCORE);
        assert_relative_eq!(breakdown.combined, 0.4 + 0.3 + 0.15);
    }

    #[test]
    fn test_clamped_to_bounds() {
        let forecast = SeriesForecast::with_std_errors(vec![1.0], vec![0.0]).unwrap();
        let perfect = stub(vec![0.0, 0.0], -500.0);
        assert_eq!(score(&perfect, &[100.0, 100.0], &forecast), MAX_CONFIDENCE);

        let noisy = SeriesForecast::with_std_errors(vec![1.0], vec![1e6]).unwrap();
        let awful = stub(vec![1e4, -1e4], 1e6);
        assert_eq!(score(&awful, &[1.0, 2.0], &noisy), MIN_CONFIDENCE);
    }

    #[test]
    fn test_failures_fall_back() {
        let forecast = SeriesForecast::new(vec![1.0]);

        let no_residuals = stub(Vec::new(), 10.0);
        assert!(matches!(
            try_score(&no_residuals, &[1.0], &forecast),
            Err(ForecastError::ScoringError(_))
        ));
        assert_eq!(score(&no_residuals, &[1.0], &forecast), FALLBACK_CONFIDENCE);

        let model = stub(vec![1.0], 10.0);
        assert_eq!(score(&model, &[], &forecast), FALLBACK_CONFIDENCE);

        let infinite = stub(vec![1.0], f64::NEG_INFINITY);
        assert_eq!(score(&infinite, &[1.0], &forecast), FALLBACK_CONFIDENCE);
    }
}
