//! # Cashflow Math
//!
//! Numeric building blocks for fitting seasonal ARIMA models.
//! This crate provides lag-polynomial algebra, the stationarity-preserving
//! parameter transform used during estimation, and a bounded Nelder-Mead
//! minimiser.

use thiserror::Error;

pub mod optimize;
pub mod polynomial;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

pub use optimize::{Minimum, NelderMead};
pub use polynomial::LagPolynomial;
