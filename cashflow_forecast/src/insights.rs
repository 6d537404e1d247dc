//! Human-readable insights comparing forecasts with history

use serde::Serialize;
use std::fmt;

/// Category of an insight message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Info,
    Warning,
    Trend,
}

/// One insight message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    pub fn info<S: Into<String>>(message: S) -> Self {
        Self {
            kind: InsightKind::Info,
            message: message.into(),
        }
    }

    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self {
            kind: InsightKind::Warning,
            message: message.into(),
        }
    }

    pub fn trend<S: Into<String>>(message: S) -> Self {
        Self {
            kind: InsightKind::Trend,
            message: message.into(),
        }
    }
}

/// Series a trend is reported for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Income,
    Expenses,
    Savings,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Metric::Income => "Income",
            Metric::Expenses => "Expenses",
            Metric::Savings => "Savings",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increase,
    Decrease,
    Same,
}

/// Percent change from `historical` to `forecast`, relative to `|historical|`.
///
/// A zero baseline yields 0.
pub fn percent_change(historical: f64, forecast: f64) -> f64 {
    if historical == 0.0 {
        return 0.0;
    }
    (forecast - historical) / historical.abs() * 100.0
}

/// Direction of a percent change given a symmetric threshold in percent
pub fn classify_trend(change_pct: f64, threshold_pct: f64) -> TrendDirection {
    if change_pct > threshold_pct {
        TrendDirection::Increase
    } else if change_pct < -threshold_pct {
        TrendDirection::Decrease
    } else {
        TrendDirection::Same
    }
}

/// Trend insight for one metric
pub fn trend_insight(
    metric: Metric,
    historical_mean: f64,
    forecast_mean: f64,
    threshold_pct: f64,
) -> Insight {
    let change = percent_change(historical_mean, forecast_mean);
    let message = match classify_trend(change, threshold_pct) {
        TrendDirection::Increase => format!(
            "{} is expected to increase by {:.1}% compared to the historical average",
            metric, change
        ),
        TrendDirection::Decrease => format!(
            "{} is expected to decrease by {:.1}% compared to the historical average",
            metric,
            change.abs()
        ),
        TrendDirection::Same => format!("{} is expected to stay roughly the same", metric),
    };
    Insight::trend(message)
}

/// Thresholds for the expense and income warnings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningRatios {
    pub expenses: f64,
    pub income: f64,
}

impl Default for WarningRatios {
    fn default() -> Self {
        Self {
            expenses: 1.2,
            income: 0.8,
        }
    }
}

/// Warnings for forecast averages that drift past the historical averages.
///
/// The two checks are independent; zero, one or both may fire.
pub fn threshold_warnings(
    historical_income: f64,
    historical_expenses: f64,
    forecast_income: f64,
    forecast_expenses: f64,
    ratios: WarningRatios,
) -> Vec<Insight> {
    let mut warnings = Vec::new();
    if forecast_expenses > historical_expenses * ratios.expenses {
        warnings.push(Insight::warning(
            "Expenses are projected above the recent average",
        ));
    }
    if forecast_income < historical_income * ratios.income {
        warnings.push(Insight::warning(
            "Income is projected below the recent average",
        ));
    }
    warnings
}

/// Savings as a share of income, 0 when income is not positive
pub fn savings_rate(income: f64, savings: f64) -> f64 {
    if income > 0.0 {
        savings / income * 100.0
    } else {
        0.0
    }
}

pub fn savings_rate_insight(income: f64, savings: f64) -> Insight {
    Insight::info(format!(
        "Predicted savings rate: {:.1}%",
        savings_rate(income, savings)
    ))
}
