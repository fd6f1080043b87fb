use std::path::PathBuf;

use clap::{ArgAction, Parser};
use cohort_summary::{Config, ReportFormat};
use log::LevelFilter;

/// Summarize a patient cohort (BMI, glucose, age) by BMI category.
///
/// Examples:
///   cohort-summary data/patients.csv
///   cohort-summary data/stroke.csv --glucose-column avg_glucose_level --columnar data/stroke.parquet
///   cohort-summary data/patients.parquet -f json -o summary.json
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Input file (.csv, .parquet or .pq)
    pub input: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// TOML configuration (columns, null tokens, BMI range, thresholds)
    #[arg(short, long, value_name = "FILE", env = "COHORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Convert a CSV input to this Parquet file first and summarize from it
    #[arg(long, value_name = "FILE")]
    pub columnar: Option<PathBuf>,

    /// Name of the glucose column in the input
    #[arg(long, value_name = "NAME")]
    pub glucose_column: Option<String>,

    /// Drop patients younger than this
    #[arg(long, value_name = "YEARS")]
    pub min_age: Option<f64>,

    /// Keep only the first row of each patient id
    #[arg(long)]
    pub dedup: bool,

    /// Verbose level (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Flags given on the command line win over the configuration file.
    pub fn merge_into(&self, config: &mut Config) {
        if let Some(ref glucose) = self.glucose_column {
            config.columns.glucose = glucose.clone();
        }
        if self.min_age.is_some() {
            config.filter.min_age = self.min_age;
        }
        if self.dedup {
            config.filter.drop_duplicate_ids = true;
        }
    }
}
