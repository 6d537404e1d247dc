//! Raw transaction rows and the tabular sources they are read from

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::ops::{AddAssign, Index, IndexMut};
use std::path::{Path, PathBuf};

/// Day number of 1970-01-01 counted from 0001-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Named money column of the daily input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Sales,
    Consulting,
    Investment,
    Payroll,
    Rent,
    Utilities,
    Technology,
    Marketing,
    Travel,
    ProfessionalServices,
    Misc,
}

impl Category {
    /// All categories in column order
    pub const ALL: [Category; 11] = [
        Category::Sales,
        Category::Consulting,
        Category::Investment,
        Category::Payroll,
        Category::Rent,
        Category::Utilities,
        Category::Technology,
        Category::Marketing,
        Category::Travel,
        Category::ProfessionalServices,
        Category::Misc,
    ];

    /// Categories summed into `income_total`
    pub const INCOME: [Category; 3] = [Category::Sales, Category::Consulting, Category::Investment];

    /// Categories summed into `expenses_total`
    pub const EXPENSES: [Category; 8] = [
        Category::Payroll,
        Category::Rent,
        Category::Utilities,
        Category::Technology,
        Category::Marketing,
        Category::Travel,
        Category::ProfessionalServices,
        Category::Misc,
    ];

    /// Column header used in CSV input and output
    pub fn column_name(self) -> &'static str {
        match self {
            Category::Sales => "sales",
            Category::Consulting => "consulting",
            Category::Investment => "investment",
            Category::Payroll => "payroll",
            Category::Rent => "rent",
            Category::Utilities => "utilities",
            Category::Technology => "technology",
            Category::Marketing => "marketing",
            Category::Travel => "travel",
            Category::ProfessionalServices => "professional_services",
            Category::Misc => "misc",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.column_name().eq_ignore_ascii_case(name))
    }

    pub fn is_income(self) -> bool {
        Self::INCOME.contains(&self)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// One amount per category
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryAmounts([f64; 11]);

impl CategoryAmounts {
    /// Sum of the income categories
    pub fn income_total(&self) -> f64 {
        Category::INCOME.iter().map(|c| self[*c]).sum()
    }

    /// Sum of the expense categories
    pub fn expenses_total(&self) -> f64 {
        Category::EXPENSES.iter().map(|c| self[*c]).sum()
    }

    /// Iterate `(category, amount)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self[c]))
    }
}

impl Index<Category> for CategoryAmounts {
    type Output = f64;

    fn index(&self, category: Category) -> &f64 {
        &self.0[category.slot()]
    }
}

impl IndexMut<Category> for CategoryAmounts {
    fn index_mut(&mut self, category: Category) -> &mut f64 {
        &mut self.0[category.slot()]
    }
}

impl AddAssign<&CategoryAmounts> for CategoryAmounts {
    fn add_assign(&mut self, other: &CategoryAmounts) {
        for (slot, value) in self.0.iter_mut().zip(other.0.iter()) {
            *slot += value;
        }
    }
}

impl FromIterator<(Category, f64)> for CategoryAmounts {
    fn from_iter<I: IntoIterator<Item = (Category, f64)>>(iter: I) -> Self {
        let mut amounts = CategoryAmounts::default();
        for (category, value) in iter {
            amounts[category] += value;
        }
        amounts
    }
}

/// One row of daily transactional input
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub amounts: CategoryAmounts,
}

impl RawRecord {
    /// A record with every category at zero
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            amounts: CategoryAmounts::default(),
        }
    }

    /// Set one category amount
    pub fn with(mut self, category: Category, amount: f64) -> Self {
        self.amounts[category] = amount;
        self
    }

    pub fn income_total(&self) -> f64 {
        self.amounts.income_total()
    }

    pub fn expenses_total(&self) -> f64 {
        self.amounts.expenses_total()
    }
}

/// Anything that can be read as a sequence of daily records
pub trait TabularSource {
    /// Read every dated row; fails with `InputError` on unusable input
    fn rows(&self) -> Result<Vec<RawRecord>>;
}

/// CSV file on disk, opened and released inside `rows`
#[derive(Debug, Clone)]
pub struct CsvPath {
    path: PathBuf,
}

impl CsvPath {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularSource for CsvPath {
    fn rows(&self) -> Result<Vec<RawRecord>> {
        let file = File::open(&self.path)?;
        let df = CsvReader::new(file)
            .has_header(true)
            .infer_schema(None)
            .finish()
            .map_err(malformed_csv)?;

        records_from_frame(&df)
    }
}

/// Raw delimited text, header row first
#[derive(Debug, Clone)]
pub struct CsvText {
    text: String,
}

impl CsvText {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}

impl TabularSource for CsvText {
    fn rows(&self) -> Result<Vec<RawRecord>> {
        if self.text.trim().is_empty() {
            return Err(ForecastError::InputError("CSV input is empty".to_string()));
        }

        let df = CsvReader::new(Cursor::new(self.text.as_bytes()))
            .has_header(true)
            .infer_schema(None)
            .finish()
            .map_err(malformed_csv)?;

        records_from_frame(&df)
    }
}

impl TabularSource for DataFrame {
    fn rows(&self) -> Result<Vec<RawRecord>> {
        records_from_frame(self)
    }
}

impl TabularSource for [RawRecord] {
    fn rows(&self) -> Result<Vec<RawRecord>> {
        Ok(self.to_vec())
    }
}

impl TabularSource for Vec<RawRecord> {
    fn rows(&self) -> Result<Vec<RawRecord>> {
        Ok(self.clone())
    }
}

fn malformed_csv(err: PolarsError) -> ForecastError {
    ForecastError::InputError(format!("Malformed CSV input: {}", err))
}

/// Parse a calendar date written as `YYYY-MM-DD`, `YYYY/MM/DD` or `M/D/YYYY`.
///
/// A time-of-day suffix after `T` or a space is ignored.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let date_part = text
        .trim()
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or_default();

    ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

/// Convert every dated row of a frame into records
fn records_from_frame(df: &DataFrame) -> Result<Vec<RawRecord>> {
    let date_column = detect_date_column(df)?;
    let dates = date_values(df.column(&date_column)?)?;

    let mut columns: Vec<(Category, Vec<f64>)> = Vec::new();
    for category in Category::ALL {
        if let Some(name) = find_column(df, category.column_name()) {
            columns.push((category, numeric_values(df.column(&name)?)?));
        }
    }

    let mut records = Vec::with_capacity(dates.len());
    for (row, date) in dates.into_iter().enumerate() {
        // Blank date cells are blank rows
        let Some(date) = date else { continue };

        let mut record = RawRecord::new(date);
        for (category, values) in &columns {
            record.amounts[*category] = values.get(row).copied().unwrap_or(0.0);
        }
        records.push(record);
    }

    Ok(records)
}

/// Find the date column: an exact `date` header, else the first header mentioning "date"
fn detect_date_column(df: &DataFrame) -> Result<String> {
    if let Some(name) = find_column(df, "date") {
        return Ok(name);
    }

    df.get_column_names()
        .into_iter()
        .find(|name| name.to_lowercase().contains("date"))
        .map(|name| name.to_string())
        .ok_or_else(|| ForecastError::InputError("No date column found in data".to_string()))
}

fn find_column(df: &DataFrame, wanted: &str) -> Option<String> {
    df.get_column_names()
        .into_iter()
        .find(|name| name.trim().eq_ignore_ascii_case(wanted))
        .map(|name| name.to_string())
}

fn date_values(series: &Series) -> Result<Vec<Option<NaiveDate>>> {
    match series.dtype() {
        DataType::Utf8 => series
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => parse_date(text).map(Some).ok_or_else(|| {
                    ForecastError::InputError(format!(
                        "Unparseable date '{}' in row {}",
                        text,
                        row + 1
                    ))
                }),
            })
            .collect(),
        DataType::Date | DataType::Datetime(_, _) => {
            let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            let values = days
                .i32()?
                .into_iter()
                .map(|day| day.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE)))
                .collect();
            Ok(values)
        }
        other => Err(ForecastError::InputError(format!(
            "Date column '{}' has unsupported type {}",
            series.name(),
            other
        ))),
    }
}

/// Category cells as f64; nulls, non-numeric text and non-finite values count as zero
fn numeric_values(series: &Series) -> Result<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    let values = cast
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| v.is_finite()).unwrap_or(0.0))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("2024-03-05", Some(day(2024, 3, 5)))]
    #[case("2024/03/05", Some(day(2024, 3, 5)))]
    #[case("3/5/2024", Some(day(2024, 3, 5)))]
    #[case("2024-03-05T10:30:00Z", Some(day(2024, 3, 5)))]
    #[case("2024-03-05 10:30:00", Some(day(2024, 3, 5)))]
    #[case(" 2024-03-05 ", Some(day(2024, 3, 5)))]
    #[case("yesterday", None)]
    #[case("2024-13-40", None)]
    fn test_parse_date(#[case] input: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_date(input), expected);
    }

    #[test]
    fn test_category_partition() {
        assert_eq!(Category::INCOME.len() + Category::EXPENSES.len(), Category::ALL.len());
        for category in Category::ALL {
            assert_eq!(category.is_income(), !Category::EXPENSES.contains(&category));
            assert_eq!(Category::from_column_name(category.column_name()), Some(category));
        }
        assert_eq!(
            Category::from_column_name(" Professional_Services "),
            Some(Category::ProfessionalServices)
        );
        assert_eq!(Category::from_column_name("coffee"), None);
    }

    #[test]
    fn test_category_totals() {
        let amounts: CategoryAmounts = [
            (Category::Sales, 100.0),
            (Category::Investment, 50.0),
            (Category::Rent, 30.0),
            (Category::Misc, 5.0),
            (Category::Misc, 5.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(amounts.income_total(), 150.0);
        assert_eq!(amounts.expenses_total(), 40.0);
        assert_eq!(amounts[Category::Misc], 10.0);
    }

    #[test]
    fn test_csv_text_rows() {
        let text = "date,sales,rent,misc\n2024-01-02,100,40,1.5\n1/3/2024,200,,2\n,999,999,999\n";
        let rows = CsvText::new(text).rows().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, day(2024, 1, 2));
        assert_eq!(rows[0].amounts[Category::Sales], 100.0);
        assert_eq!(rows[0].amounts[Category::Misc], 1.5);
        assert_eq!(rows[1].date, day(2024, 1, 3));
        assert_eq!(rows[1].amounts[Category::Rent], 0.0);
        // Columns absent from the header contribute zero
        assert_eq!(rows[1].amounts[Category::Payroll], 0.0);
    }

    #[test]
    fn test_missing_date_column() {
        let result = CsvText::new("sales,rent\n1,2\n").rows();
        assert!(matches!(result, Err(ForecastError::InputError(_))));
    }

    #[test]
    fn test_unparseable_date() {
        let result = CsvText::new("date,sales\n2024-01-01,1\nnot-a-date,2\n").rows();
        match result {
            Err(ForecastError::InputError(msg)) => assert!(msg.contains("row 2")),
            other => panic!("expected InputError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(matches!(
            CsvText::new("  \n").rows(),
            Err(ForecastError::InputError(_))
        ));
    }

    #[test]
    fn test_dataframe_source() {
        let df = df!(
            "date" => &["2024-02-01", "2024-02-15"],
            "payroll" => &[1000i64, 1000],
            "consulting" => &[250.0, 125.5]
        )
        .unwrap();

        let rows = df.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].amounts[Category::Consulting], 125.5);
        assert_eq!(rows[0].expenses_total(), 1000.0);
    }

    #[test]
    fn test_dataframe_with_native_dates() {
        let dates = Series::new("date", &[19_723i32, 19_754])
            .cast(&DataType::Date)
            .unwrap();
        let sales = Series::new("sales", &[10.0, 20.0]);
        let df = DataFrame::new(vec![dates, sales]).unwrap();

        let rows = df.rows().unwrap();
        assert_eq!(rows[0].date, day(2024, 1, 1));
        assert_eq!(rows[1].date, day(2024, 2, 1));
    }

    #[test]
    fn test_record_slice_source() {
        let records = vec![RawRecord::new(day(2024, 1, 1)).with(Category::Sales, 5.0)];
        assert_eq!(records.as_slice().rows().unwrap(), records);
    }
}
