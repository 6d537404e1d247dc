use cashflow_forecast::confidence;
use cashflow_forecast::models::{ModelSelector, TrainedForecastModel};
use cashflow_forecast::transactions::{daily_records, Transaction, TransactionKind};
use cashflow_forecast::{Forecaster, MonthlySeries};
use chrono::NaiveDate;
use std::f64::consts::PI;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two years of dashboard transactions: monthly sales with a yearly cycle,
    // rent and a few irregular expenses
    let mut transactions = Vec::new();
    for i in 0..24u32 {
        let date = NaiveDate::from_ymd_opt(2023 + (i / 12) as i32, i % 12 + 1, 10)
            .ok_or("invalid date")?;
        let season = (2.0 * PI * (i % 12) as f64 / 12.0).sin();

        transactions.push(Transaction::new(
            date,
            TransactionKind::Income,
            "Sales Revenue",
            20_000.0 + 4_000.0 * season,
        ));
        transactions.push(Transaction::new(
            date,
            TransactionKind::Expense,
            "Office Rent",
            3_500.0,
        ));
        transactions.push(Transaction::new(
            date,
            TransactionKind::Expense,
            "Equipment",
            500.0 + 40.0 * i as f64,
        ));
    }

    let records = daily_records(&transactions);
    let series = MonthlySeries::from_records(records.clone())?;
    println!("Aggregated {} months", series.len());

    // Inspect the model chosen for income
    let income = series.income();
    let selection = ModelSelector::default().select(&income)?;
    let forecast = selection.fit.forecast(12)?;
    println!(
        "Income model {} (AIC {:.1}, {} of {} candidates failed)",
        selection.fit.name(),
        selection.fit.aic(),
        selection.failed,
        selection.evaluated
    );
    println!(
        "Income confidence: {:.2}",
        confidence::score(&selection.fit, &income, &forecast)
    );

    // Full monthly forecast
    let result = Forecaster::default().forecast_next_12_months(&records)?;
    for month in &result.monthly_predictions {
        println!(
            "{}: income {:>8} expenses {:>8} savings {:>8}",
            month.month, month.income, month.expenses, month.savings
        );
    }
    for insight in &result.insights {
        println!("[{:?}] {}", insight.kind, insight.message);
    }

    Ok(())
}
