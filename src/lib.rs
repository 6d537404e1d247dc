//! # Cashflow Workspace
//!
//! Umbrella crate over the workspace members:
//!
//! - [`cashflow_math`]: lag polynomials and the simplex optimiser used to fit models
//! - [`cashflow_forecast`]: aggregation, model selection, confidence scoring and insights
//!
//! ```no_run
//! use cashflow_workspace::cashflow_forecast::{forecast_next_year, CsvText};
//!
//! let csv = "date,sales,rent\n2024-01-05,1200,800\n2024-02-05,1300,800\n";
//! let result = forecast_next_year(&CsvText::new(csv)).unwrap();
//! println!("{}", result.predictions.savings);
//! ```

pub use cashflow_forecast;
pub use cashflow_math;
