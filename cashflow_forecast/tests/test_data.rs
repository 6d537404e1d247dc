use cashflow_forecast::data::{Category, CsvPath, CsvText, TabularSource};
use cashflow_forecast::{ForecastError, MonthlySeries};
use chrono::NaiveDate;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_csv_path_with_partial_schema() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,sales,rent,payroll").unwrap();
    writeln!(file, "2024-01-03,100.0,50.0,20.0").unwrap();
    writeln!(file, "2024-01-17,200.0,,30.0").unwrap();
    writeln!(file, "2024-02-01,300.0,50.0,0").unwrap();

    let rows = CsvPath::new(file.path()).rows().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].date, day(2024, 1, 3));
    assert_eq!(rows[1].amounts[Category::Rent], 0.0);
    assert_eq!(rows[2].amounts[Category::Consulting], 0.0);

    let series = MonthlySeries::from_source(&CsvPath::new(file.path())).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.income(), vec![300.0, 300.0]);
    assert_eq!(series.expenses(), vec![100.0, 50.0]);
    assert_eq!(series.savings(), vec![200.0, 250.0]);
}

#[test]
fn test_csv_text_with_us_dates_and_blank_rows() {
    let text = "date,sales,consulting,misc\n\
                1/15/2024,10,5,1\n\
                ,99,99,99\n\
                2/1/2024,20,0,2\n";

    let rows = CsvText::new(text).rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, day(2024, 1, 15));
    assert_eq!(rows[0].income_total(), 15.0);
    assert_eq!(rows[1].expenses_total(), 2.0);
}

#[test]
fn test_dataframe_source() {
    let df = df! {
        "Date" => &["2024-03-01", "2024-03-02", "2024-04-10"],
        "sales" => &[1.0, 2.0, 4.0],
        "technology" => &[0.5, 0.5, 1.0],
    }
    .unwrap();

    let series = MonthlySeries::from_source(&df).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.buckets()[0].income_total, 3.0);
    assert_eq!(series.buckets()[0].expenses_total, 1.0);
    assert_eq!(series.buckets()[1].month.to_string(), "2024-04");
}

#[test]
fn test_unparseable_date_names_the_row() {
    let text = "date,sales\n2024-01-01,5\nnot-a-date,7\n";
    match CsvText::new(text).rows() {
        Err(ForecastError::InputError(message)) => {
            assert!(message.contains("not-a-date"), "{}", message);
            assert!(message.contains("row 2"), "{}", message);
        }
        other => panic!("expected InputError, got {:?}", other),
    }
}

#[test]
fn test_missing_date_column() {
    let result = CsvText::new("day,sales\n2024-01-01,5\n").rows();
    assert!(matches!(result, Err(ForecastError::InputError(_))));
}

#[test]
fn test_empty_text() {
    let result = CsvText::new("   \n").rows();
    assert!(matches!(result, Err(ForecastError::InputError(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = CsvPath::new(dir.path().join("absent.csv")).rows();
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_late_decimal_in_whole_number_column() {
    let start = day(2021, 1, 1);
    let mut text = String::from("date,sales,travel\n");
    for offset in 0..1100 {
        let date = start + chrono::Duration::days(offset);
        let travel = if offset == 1050 { "125.50" } else { "0" };
        text.push_str(&format!("{},100,{}\n", date.format("%Y-%m-%d"), travel));
    }

    let rows = CsvText::new(text.clone()).rows().unwrap();
    assert_eq!(rows.len(), 1100);
    assert_eq!(rows[1050].amounts[Category::Travel], 125.5);
    assert_eq!(rows[1049].amounts[Category::Travel], 0.0);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let from_file = CsvPath::new(file.path()).rows().unwrap();
    assert_eq!(from_file, rows);

    let series = MonthlySeries::from_source(&CsvText::new(text)).unwrap();
    let total_expenses: f64 = series.expenses().iter().sum();
    assert_eq!(total_expenses, 125.5);
}
