//! Run configuration, read from an optional TOML file.
//!
//! Every section falls back to its defaults, so an empty file (or no file)
//! reproduces the standard clinical cutoffs over the `bmi`, `glucose` and
//! `age` columns.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bucket::BmiThresholds;
use crate::error::{CohortError, Result};
use crate::records::{AGE, BMI, GLUCOSE, ID};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub columns: ColumnNames,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub buckets: BmiThresholds,
}

/// Names of the source columns. `id` is optional in the data: when the
/// column is absent the row number is used instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub id: String,
    pub bmi: String,
    pub glucose: String,
    pub age: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            id: ID.to_string(),
            bmi: BMI.to_string(),
            glucose: GLUCOSE.to_string(),
            age: AGE.to_string(),
        }
    }
}

impl ColumnNames {
    /// Names used by frames that were already projected (and by the
    /// columnar files written by `convert_to_columnar`).
    pub fn canonical() -> Self {
        ColumnNames::default()
    }

    pub fn required(&self) -> [&str; 3] {
        [self.bmi.as_str(), self.glucose.as_str(), self.age.as_str()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Tokens read as missing values in CSV input.
    pub null_values: Vec<String>,

    /// Rows scanned to infer CSV column types.
    pub infer_schema_length: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            null_values: vec!["N/A".to_string(), "NA".to_string()],
            infer_schema_length: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Inclusive lower bound of a physiologically plausible BMI.
    pub bmi_min: f64,

    /// Inclusive upper bound of a physiologically plausible BMI.
    pub bmi_max: f64,

    /// Drop patients younger than this before summarizing.
    pub min_age: Option<f64>,

    /// Keep only the first row for each patient id.
    pub drop_duplicate_ids: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            bmi_min: 10.0,
            bmi_max: 60.0,
            min_age: None,
            drop_duplicate_ids: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|e| CohortError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Config::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.buckets.validate()?;

        let f = &self.filter;
        if !f.bmi_min.is_finite() || !f.bmi_max.is_finite() || f.bmi_min > f.bmi_max {
            return Err(CohortError::Config {
                message: format!("invalid BMI range [{}, {}]", f.bmi_min, f.bmi_max),
            });
        }
        if let Some(age) = f.min_age {
            if !age.is_finite() {
                return Err(CohortError::Config {
                    message: format!("invalid minimum age {}", age),
                });
            }
        }
        Ok(())
    }
}
