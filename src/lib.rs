//! Summarizes a patient cohort by BMI category.
//!
//! The pipeline is a single lazy polars query: scan the input, drop
//! physiologically implausible BMI values, label each row with its
//! [`BmiBucket`] and aggregate count, mean glucose and mean age per bucket.

pub mod bucket;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod records;
pub mod report;

use std::path::Path;

pub use bucket::{bucket, BmiBucket, BmiThresholds};
pub use config::Config;
pub use error::{CohortError, EmptyResultWarning, InputError};
pub use pipeline::{clean, filter_valid, summarize, BucketSummary, CohortSummary};
pub use records::{collect_records, records_to_frame, PatientRecord};
pub use report::{render, report, ReportFormat};

/// Loads `path` and runs the whole pipeline with `config`.
pub fn summarize_file(path: &Path, config: &Config) -> error::Result<CohortSummary> {
    config.validate()?;
    let frame = io::load(path, &config.columns, &config.input)?;
    let frame = clean(frame, &config.filter);
    summarize(frame, &config.filter, &config.buckets)
}

/// Like [`summarize_file`], but a CSV input is first converted to the
/// Parquet file at `columnar` and the summary is computed from that copy.
/// Non-CSV inputs are summarized directly.
pub fn summarize_input(
    path: &Path,
    columnar: Option<&Path>,
    config: &Config,
) -> error::Result<CohortSummary> {
    match columnar {
        Some(parquet) if io::InputFormat::infer(path) == Some(io::InputFormat::Csv) => {
            config.validate()?;
            io::convert_to_columnar(path, parquet, &config.columns, &config.input)?;
            // the columnar copy carries the canonical column names
            let columnar = Config {
                columns: config::ColumnNames::canonical(),
                ..config.clone()
            };
            summarize_file(parquet, &columnar)
        }
        Some(_) => {
            log::info!("{} is not a CSV file, skipping columnar conversion", path.display());
            summarize_file(path, config)
        }
        None => summarize_file(path, config),
    }
}
