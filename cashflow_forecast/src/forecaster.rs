//! Forecast orchestration
//!
//! Aggregates the input, selects a model for the income and expense series
//! independently, projects both forward and assembles the result returned to
//! callers.

use crate::aggregation::{MonthlySeries, YearMonth};
use crate::config::ForecastConfig;
use crate::confidence;
use crate::data::TabularSource;
use crate::error::{ForecastError, Result};
use crate::insights::{
    savings_rate_insight, threshold_warnings, trend_insight, Insight, Metric, WarningRatios,
};
use crate::models::{ModelSelector, SeriesForecast, TrainedForecastModel};
use serde::Serialize;
use statrs::statistics::Statistics;
use tracing::{info, instrument};

/// Months projected by the monthly and yearly modes
pub const FORECAST_HORIZON: usize = 12;

/// One projected month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPrediction {
    pub month: YearMonth,
    pub income: i64,
    pub expenses: i64,
    pub savings: i64,
}

/// Totals and per-month averages over the projected months
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub total_income: i64,
    pub total_expenses: i64,
    pub total_savings: i64,
    pub avg_monthly_income: i64,
    pub avg_monthly_expenses: i64,
    pub avg_monthly_savings: i64,
    pub confidence: f64,
}

/// Result of [`Forecaster::forecast_next_12_months`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyForecast {
    pub monthly_predictions: Vec<MonthlyPrediction>,
    pub summary: ForecastSummary,
    pub insights: Vec<Insight>,
}

/// Rounded amounts with the combined confidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub income: i64,
    pub expenses: i64,
    pub savings: i64,
    pub confidence: f64,
}

/// Result of [`Forecaster::forecast_next_year`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyForecast {
    pub predictions: Prediction,
    pub insights: Vec<Insight>,
}

/// Result of [`Forecaster::forecast_next_month`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextMonthForecast {
    pub month: YearMonth,
    pub predictions: Prediction,
    pub insights: Vec<Insight>,
}

/// Projection of one series
#[derive(Debug)]
struct SeriesProjection {
    forecast: SeriesForecast,
    historical_mean: f64,
    confidence: f64,
}

impl SeriesProjection {
    fn forecast_mean(&self) -> f64 {
        self.forecast.values().iter().mean()
    }
}

/// Income and expense projections for one request
#[derive(Debug)]
struct Projections {
    last_month: YearMonth,
    income: SeriesProjection,
    expenses: SeriesProjection,
}

impl Projections {
    /// Mean of the two confidences, rounded to two decimals
    fn confidence(&self) -> f64 {
        round_to_cents((self.income.confidence + self.expenses.confidence) / 2.0)
    }

    fn warnings(&self, ratios: WarningRatios) -> Vec<Insight> {
        threshold_warnings(
            self.income.historical_mean,
            self.expenses.historical_mean,
            self.income.forecast_mean(),
            self.expenses.forecast_mean(),
            ratios,
        )
    }
}

/// Forecasting engine
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    config: ForecastConfig,
    selector: ModelSelector,
}

impl Forecaster {
    /// Create an engine from a validated configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let selector = ModelSelector::from_config(&config);
        Ok(Self { config, selector })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Month-by-month projection of the next 12 months
    #[instrument(skip_all)]
    pub fn forecast_next_12_months<S>(&self, source: &S) -> Result<MonthlyForecast>
    where
        S: TabularSource + ?Sized,
    {
        let series = MonthlySeries::from_source(source)?;
        self.monthly_from_series(&series)
    }

    /// Totals over the next 12 months
    #[instrument(skip_all)]
    pub fn forecast_next_year<S>(&self, source: &S) -> Result<YearlyForecast>
    where
        S: TabularSource + ?Sized,
    {
        let series = MonthlySeries::from_source(source)?;
        self.yearly_from_series(&series)
    }

    /// Projection of the single month after the last observed one
    #[instrument(skip_all)]
    pub fn forecast_next_month<S>(&self, source: &S) -> Result<NextMonthForecast>
    where
        S: TabularSource + ?Sized,
    {
        let series = MonthlySeries::from_source(source)?;
        self.next_month_from_series(&series)
    }

    pub fn monthly_from_series(&self, series: &MonthlySeries) -> Result<MonthlyForecast> {
        let projections = self.project(series, FORECAST_HORIZON)?;

        let monthly_predictions: Vec<MonthlyPrediction> = projections
            .income
            .forecast
            .values()
            .iter()
            .zip(projections.expenses.forecast.values())
            .enumerate()
            .map(|(i, (income, expenses))| {
                let income = round_amount(*income);
                let expenses = round_amount(*expenses);
                MonthlyPrediction {
                    month: projections.last_month.plus_months(i as u32 + 1),
                    income,
                    expenses,
                    savings: income - expenses,
                }
            })
            .collect();

        let total_income: i64 = monthly_predictions.iter().map(|p| p.income).sum();
        let total_expenses: i64 = monthly_predictions.iter().map(|p| p.expenses).sum();
        let total_savings: i64 = monthly_predictions.iter().map(|p| p.savings).sum();
        let months = FORECAST_HORIZON as i64;

        let summary = ForecastSummary {
            total_income,
            total_expenses,
            total_savings,
            avg_monthly_income: total_income / months,
            avg_monthly_expenses: total_expenses / months,
            avg_monthly_savings: total_savings / months,
            confidence: projections.confidence(),
        };

        let threshold = self.config.trend_threshold_pct;
        let income = &projections.income;
        let expenses = &projections.expenses;
        let historical_savings = income.historical_mean - expenses.historical_mean;
        let forecast_savings = income.forecast_mean() - expenses.forecast_mean();

        let mut insights = vec![
            savings_rate_insight(total_income as f64, total_savings as f64),
            trend_insight(
                Metric::Income,
                income.historical_mean,
                income.forecast_mean(),
                threshold,
            ),
            trend_insight(
                Metric::Expenses,
                expenses.historical_mean,
                expenses.forecast_mean(),
                threshold,
            ),
            trend_insight(Metric::Savings, historical_savings, forecast_savings, threshold),
        ];
        insights.extend(projections.warnings(self.warning_ratios()));

        info!(
            last_month = %projections.last_month,
            total_income,
            total_expenses,
            confidence = summary.confidence,
            "monthly forecast ready"
        );

        Ok(MonthlyForecast {
            monthly_predictions,
            summary,
            insights,
        })
    }

    pub fn yearly_from_series(&self, series: &MonthlySeries) -> Result<YearlyForecast> {
        let projections = self.project(series, FORECAST_HORIZON)?;

        let income = round_amount(projections.income.forecast.total());
        let expenses = round_amount(projections.expenses.forecast.total());
        let predictions = Prediction {
            income,
            expenses,
            savings: income - expenses,
            confidence: projections.confidence(),
        };

        let mut insights = vec![savings_rate_insight(income as f64, predictions.savings as f64)];
        insights.extend(projections.warnings(self.warning_ratios()));

        info!(
            last_month = %projections.last_month,
            income,
            expenses,
            confidence = predictions.confidence,
            "yearly forecast ready"
        );

        Ok(YearlyForecast {
            predictions,
            insights,
        })
    }

    pub fn next_month_from_series(&self, series: &MonthlySeries) -> Result<NextMonthForecast> {
        let projections = self.project(series, 1)?;

        let income = round_amount(projections.income.forecast.total());
        let expenses = round_amount(projections.expenses.forecast.total());
        let predictions = Prediction {
            income,
            expenses,
            savings: income - expenses,
            confidence: projections.confidence(),
        };

        let mut insights = vec![savings_rate_insight(income as f64, predictions.savings as f64)];
        insights.extend(projections.warnings(self.warning_ratios()));

        let month = projections.last_month.plus_months(1);
        info!(%month, income, expenses, "next-month forecast ready");

        Ok(NextMonthForecast {
            month,
            predictions,
            insights,
        })
    }

    fn warning_ratios(&self) -> WarningRatios {
        WarningRatios {
            expenses: self.config.expense_warning_ratio,
            income: self.config.income_warning_ratio,
        }
    }

    fn project(&self, series: &MonthlySeries, horizons: usize) -> Result<Projections> {
        let last_month = series
            .last_month()
            .ok_or_else(|| ForecastError::InputError("Monthly series is empty".to_string()))?;

        Ok(Projections {
            last_month,
            income: self.project_series("income", &series.income(), horizons)?,
            expenses: self.project_series("expenses", &series.expenses(), horizons)?,
        })
    }

    fn project_series(&self, name: &str, values: &[f64], horizons: usize) -> Result<SeriesProjection> {
        let selection = self
            .selector
            .select(values)
            .map_err(|err| err.context(format!("{} series, model selection", name)))?;
        let forecast = selection
            .fit
            .forecast(horizons)
            .map_err(|err| err.context(format!("{} series, forecast", name)))?;
        let confidence = confidence::score(&selection.fit, values, &forecast);

        info!(
            series = name,
            model = selection.fit.name(),
            fallback = selection.used_fallback,
            confidence,
            "projected series"
        );

        Ok(SeriesProjection {
            forecast,
            historical_mean: values.iter().mean(),
            confidence,
        })
    }
}

/// Month-by-month projection of the next 12 months with the default configuration
pub fn forecast_next_12_months<S: TabularSource + ?Sized>(source: &S) -> Result<MonthlyForecast> {
    Forecaster::default().forecast_next_12_months(source)
}

/// Totals over the next 12 months with the default configuration
pub fn forecast_next_year<S: TabularSource + ?Sized>(source: &S) -> Result<YearlyForecast> {
    Forecaster::default().forecast_next_year(source)
}

/// Next month's projection with the default configuration
pub fn forecast_next_month<S: TabularSource + ?Sized>(source: &S) -> Result<NextMonthForecast> {
    Forecaster::default().forecast_next_month(source)
}

/// Round half away from zero to whole currency units
fn round_amount(value: f64) -> i64 {
    value.round() as i64
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
