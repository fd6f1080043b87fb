use std::fmt;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Problems with the dataset itself. Always fatal.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("input file not found {path:?}")]
    NotFound { path: PathBuf },
    #[error("unsupported input format {path:?} (expected .csv, .parquet or .pq)")]
    UnsupportedFormat { path: PathBuf },
    #[error("missing required column {column:?} in {path:?}")]
    MissingColumn { column: String, path: PathBuf },
    #[error("could not read input: {0}")]
    Parse(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum CohortError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("invalid configuration: {message}")]
    Config { message: String },
    #[error("could not write output {path:?}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize report: {message}")]
    Serialize { message: String },
}

impl From<PolarsError> for CohortError {
    fn from(e: PolarsError) -> Self {
        CohortError::Input(InputError::Parse(e))
    }
}

impl From<serde_json::Error> for CohortError {
    fn from(e: serde_json::Error) -> Self {
        CohortError::Serialize { message: e.to_string() }
    }
}

impl From<csv::Error> for CohortError {
    fn from(e: csv::Error) -> Self {
        CohortError::Serialize { message: e.to_string() }
    }
}

impl From<toml::de::Error> for CohortError {
    fn from(e: toml::de::Error) -> Self {
        CohortError::Config { message: e.to_string() }
    }
}

pub type Result<T, E = CohortError> = std::result::Result<T, E>;

/// No record survived filtering. The run still succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyResultWarning;

impl fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no records survived the BMI range filter")
    }
}
