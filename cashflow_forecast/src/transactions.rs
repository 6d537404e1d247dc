//! Labelled transactions and their daily-row form
//!
//! Dashboards record individual transactions such as "Office Rent, 1200".
//! The engine consumes one row per day with a column per category; this
//! module converts between the two shapes.

use crate::data::{Category, RawRecord};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// One labelled money movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new<S: Into<String>>(date: NaiveDate, kind: TransactionKind, category: S, amount: f64) -> Self {
        Self {
            date,
            kind,
            category: category.into(),
            amount,
        }
    }

    /// Column this transaction is summed into, if any.
    ///
    /// Unknown expense labels land in `misc`; income labels that do not name
    /// an income column are dropped.
    pub fn column(&self) -> Option<Category> {
        let category = category_for_label(&self.category);
        match self.kind {
            TransactionKind::Income => Some(category).filter(|c| c.is_income()),
            TransactionKind::Expense => Some(category).filter(|c| !c.is_income()),
        }
    }
}

/// Map a display label to its column; unknown labels map to `misc`
pub fn category_for_label(label: &str) -> Category {
    match label.trim() {
        "Sales Revenue" => Category::Sales,
        "Office Rent" => Category::Rent,
        "Other" | "Equipment" | "Insurance" | "Training" => Category::Misc,
        other => {
            let snake = other.replace(' ', "_");
            Category::from_column_name(&snake).unwrap_or(Category::Misc)
        }
    }
}

/// Display label used for a column
pub fn label_for_category(category: Category) -> String {
    match category {
        Category::Sales => "Sales Revenue".to_string(),
        Category::Rent => "Office Rent".to_string(),
        other => other
            .column_name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Sum transactions into one record per day, in date order
pub fn daily_records(transactions: &[Transaction]) -> Vec<RawRecord> {
    let mut days: BTreeMap<NaiveDate, RawRecord> = BTreeMap::new();
    for transaction in transactions {
        let record = days
            .entry(transaction.date)
            .or_insert_with(|| RawRecord::new(transaction.date));
        if let Some(category) = transaction.column() {
            record.amounts[category] += transaction.amount;
        }
    }
    days.into_values().collect()
}

/// Split daily rows into one transaction per positive category amount
pub fn transactions_from_records(records: &[RawRecord]) -> Vec<Transaction> {
    records
        .iter()
        .flat_map(|record| {
            record
                .amounts
                .iter()
                .filter(|(_, amount)| *amount > 0.0)
                .map(move |(category, amount)| {
                    let kind = if category.is_income() {
                        TransactionKind::Income
                    } else {
                        TransactionKind::Expense
                    };
                    Transaction::new(record.date, kind, label_for_category(category), amount)
                })
        })
        .collect()
}

/// Write records as CSV with a `date` column followed by every category column
pub fn write_daily_csv<W: Write>(records: &[RawRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["date"];
    header.extend(Category::ALL.iter().map(|c| c.column_name()));
    csv_writer.write_record(&header)?;

    for record in records {
        let mut row = vec![record.date.format("%Y-%m-%d").to_string()];
        row.extend(record.amounts.iter().map(|(_, amount)| amount.to_string()));
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Render records as CSV text
pub fn daily_csv_string(records: &[RawRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_daily_csv(records, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| ForecastError::CsvError(err.to_string()))
}
