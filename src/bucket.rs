use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::CohortError;

/// BMI category, ordered from lowest to highest BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BmiBucket {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiBucket {
    pub const ALL: [BmiBucket; 4] = [
        BmiBucket::Underweight,
        BmiBucket::Normal,
        BmiBucket::Overweight,
        BmiBucket::Obese,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BmiBucket::Underweight => "Underweight",
            BmiBucket::Normal => "Normal",
            BmiBucket::Overweight => "Overweight",
            BmiBucket::Obese => "Obese",
        }
    }

    pub fn from_label(label: &str) -> Option<BmiBucket> {
        BmiBucket::ALL.into_iter().find(|b| b.label() == label)
    }
}

impl fmt::Display for BmiBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Upper bounds (exclusive) of the three lower buckets. Anything at or
/// above `overweight_below` is Obese.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BmiThresholds {
    pub underweight_below: f64,
    pub normal_below: f64,
    pub overweight_below: f64,
}

impl Default for BmiThresholds {
    fn default() -> Self {
        BmiThresholds {
            underweight_below: 18.5,
            normal_below: 25.0,
            overweight_below: 30.0,
        }
    }
}

impl BmiThresholds {
    pub fn validate(&self) -> Result<(), CohortError> {
        let bounds = [
            self.underweight_below,
            self.normal_below,
            self.overweight_below,
        ];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(CohortError::Config {
                message: "BMI thresholds must be finite".to_string(),
            });
        }
        if !(bounds[0] < bounds[1] && bounds[1] < bounds[2]) {
            return Err(CohortError::Config {
                message: format!(
                    "BMI thresholds must be strictly increasing, got {} / {} / {}",
                    bounds[0], bounds[1], bounds[2]
                ),
            });
        }
        Ok(())
    }

    /// Human readable BMI interval covered by `bucket`.
    pub fn range_label(&self, bucket: BmiBucket) -> String {
        match bucket {
            BmiBucket::Underweight => format!("< {}", self.underweight_below),
            BmiBucket::Normal => format!("{}-{}", self.underweight_below, self.normal_below),
            BmiBucket::Overweight => format!("{}-{}", self.normal_below, self.overweight_below),
            BmiBucket::Obese => format!(">= {}", self.overweight_below),
        }
    }
}

/// Assigns a BMI value to its bucket. Total over f64: NaN falls through
/// to Obese, callers filter it out beforehand.
pub fn bucket(bmi: f64, thresholds: &BmiThresholds) -> BmiBucket {
    if bmi < thresholds.underweight_below {
        BmiBucket::Underweight
    } else if bmi < thresholds.normal_below {
        BmiBucket::Normal
    } else if bmi < thresholds.overweight_below {
        BmiBucket::Overweight
    } else {
        BmiBucket::Obese
    }
}

/// Maps a bmi column to bucket labels, for use with `Expr::map`.
pub fn bucket_lazy(column: Series, thresholds: BmiThresholds) -> Result<Option<Series>, PolarsError> {
    let bmi = column.cast(&DataType::Float64)?;
    let labels: Vec<Option<&str>> = bmi
        .f64()?
        .into_iter()
        .map(|val| val.map(|b| bucket(b, &thresholds).label()))
        .collect();
    Ok(Option::from(Series::new(column.name(), labels)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_cutoffs() {
        let t = BmiThresholds::default();
        assert_eq!(bucket(10.0, &t), BmiBucket::Underweight);
        assert_eq!(bucket(18.49, &t), BmiBucket::Underweight);
        assert_eq!(bucket(18.5, &t), BmiBucket::Normal);
        assert_eq!(bucket(24.99, &t), BmiBucket::Normal);
        assert_eq!(bucket(25.0, &t), BmiBucket::Overweight);
        assert_eq!(bucket(29.99, &t), BmiBucket::Overweight);
        assert_eq!(bucket(30.0, &t), BmiBucket::Obese);
        assert_eq!(bucket(60.0, &t), BmiBucket::Obese);
    }

    #[test]
    fn every_valid_bmi_lands_in_exactly_one_bucket() {
        let t = BmiThresholds::default();
        let mut bmi = 10.0;
        let mut previous = BmiBucket::Underweight;
        while bmi <= 60.0 {
            let b = bucket(bmi, &t);
            let matches = BmiBucket::ALL
                .iter()
                .filter(|candidate| match candidate {
                    BmiBucket::Underweight => bmi < t.underweight_below,
                    BmiBucket::Normal => bmi >= t.underweight_below && bmi < t.normal_below,
                    BmiBucket::Overweight => bmi >= t.normal_below && bmi < t.overweight_below,
                    BmiBucket::Obese => bmi >= t.overweight_below,
                })
                .count();
            assert_eq!(matches, 1, "bmi {}", bmi);
            // monotonic in bmi
            assert!(b >= previous);
            previous = b;
            bmi += 0.05;
        }
    }

    #[test]
    fn custom_thresholds_shift_the_boundaries() {
        let t = BmiThresholds {
            underweight_below: 20.0,
            normal_below: 23.0,
            overweight_below: 27.5,
        };
        assert_eq!(bucket(19.0, &t), BmiBucket::Underweight);
        assert_eq!(bucket(24.0, &t), BmiBucket::Overweight);
        assert_eq!(bucket(27.5, &t), BmiBucket::Obese);
    }

    #[test]
    fn thresholds_must_increase() {
        assert!(BmiThresholds::default().validate().is_ok());
        let bad = BmiThresholds {
            underweight_below: 25.0,
            normal_below: 18.5,
            overweight_below: 30.0,
        };
        assert!(matches!(bad.validate(), Err(CohortError::Config { .. })));
        let nan = BmiThresholds {
            overweight_below: f64::NAN,
            ..BmiThresholds::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn labels_round_trip() {
        for b in BmiBucket::ALL {
            assert_eq!(BmiBucket::from_label(b.label()), Some(b));
        }
        assert_eq!(BmiBucket::from_label("Morbid"), None);
    }

    #[test]
    fn series_labels_keep_nulls() {
        let s = Series::new("bmi", &[Some(17.0f64), None, Some(33.0)]);
        let out = bucket_lazy(s, BmiThresholds::default()).unwrap().unwrap();
        let labels: Vec<Option<&str>> = out.utf8().unwrap().into_iter().collect();
        assert_eq!(labels, vec![Some("Underweight"), None, Some("Obese")]);
    }
}
