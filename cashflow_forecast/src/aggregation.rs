//! Daily-to-monthly aggregation

use crate::data::{CategoryAmounts, RawRecord, TabularSource};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ForecastError::InputError(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month `count` months later
    pub fn plus_months(&self, count: u32) -> Self {
        let zero_based = self.year as i64 * 12 + (self.month as i64 - 1) + count as i64;
        Self {
            year: zero_based.div_euclid(12) as i32,
            month: zero_based.rem_euclid(12) as u32 + 1,
        }
    }

    /// First day of the month
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Summed totals of one calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBucket {
    pub month: YearMonth,
    /// Zero-based position in the chronological sequence
    pub time_index: usize,
    pub amounts: CategoryAmounts,
    pub income_total: f64,
    pub expenses_total: f64,
}

impl MonthlyBucket {
    pub fn savings(&self) -> f64 {
        self.income_total - self.expenses_total
    }
}

/// Chronological monthly time series built from daily records
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    buckets: Vec<MonthlyBucket>,
}

impl MonthlySeries {
    /// Read a source and aggregate its rows
    pub fn from_source<S: TabularSource + ?Sized>(source: &S) -> Result<Self> {
        Self::from_records(source.rows()?)
    }

    /// Group records by calendar month, summing each category.
    ///
    /// Only months with at least one record appear; time indices run
    /// `0..len()` in chronological order.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut grouped: BTreeMap<YearMonth, CategoryAmounts> = BTreeMap::new();
        for record in records {
            *grouped.entry(YearMonth::of(record.date)).or_default() += &record.amounts;
        }

        if grouped.is_empty() {
            return Err(ForecastError::InputError(
                "Input contains no dated rows".to_string(),
            ));
        }

        let buckets = grouped
            .into_iter()
            .enumerate()
            .map(|(time_index, (month, amounts))| MonthlyBucket {
                month,
                time_index,
                income_total: amounts.income_total(),
                expenses_total: amounts.expenses_total(),
                amounts,
            })
            .collect();

        Ok(Self { buckets })
    }

    pub fn buckets(&self) -> &[MonthlyBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Latest observed month
    pub fn last_month(&self) -> Option<YearMonth> {
        self.buckets.last().map(|b| b.month)
    }

    pub fn income(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.income_total).collect()
    }

    pub fn expenses(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.expenses_total).collect()
    }

    pub fn savings(&self) -> Vec<f64> {
        self.buckets.iter().map(MonthlyBucket::savings).collect()
    }
}
