//! Load and analysis error types.
//!
//! Loading never aborts the pipeline: a failed load surfaces a [`LoadWarning`]
//! and falls back to sample data. [`AnalysisError`] marks a single report
//! section that cannot be computed on the current data.

use std::path::PathBuf;
use thiserror::Error;

/// Hard failure while reading a sales sheet. Converted to a warning by the loader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse sheet: {0}")]
    Sheet(#[from] polars::prelude::PolarsError),
}

/// User-facing notice produced while loading. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadWarning {
    #[error("input file not found: {}; using sample data", .0.display())]
    FileNotFound(PathBuf),

    #[error("input is missing required columns: {}; using sample data", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("failed to load input ({0}); using sample data")]
    Unreadable(String),

    #[error("ship_month value {0:?} is not a date; monthly analysis is unavailable")]
    UnparsedShipMonth(String),

    #[error("{count} empty value(s) in column {column} treated as 0")]
    NullNumeric { column: &'static str, count: usize },

    #[error("{count} invalid value(s) in column {column} (first: {first:?}) treated as 0")]
    InvalidNumeric {
        column: &'static str,
        count: usize,
        first: String,
    },
}

impl From<LoadError> for LoadWarning {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::MissingColumns(columns) => LoadWarning::MissingColumns(columns),
            other => LoadWarning::Unreadable(other.to_string()),
        }
    }
}

/// A report section that cannot be produced from the current data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("ship_month could not be parsed as dates; monthly analysis skipped")]
    ShipMonthUnparsed,

    #[error(
        "insufficient data for co-occurrence analysis ({customers} customer(s), {products} product(s); need at least 2 of each)"
    )]
    InsufficientData { customers: usize, products: usize },
}
