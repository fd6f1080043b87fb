use std::collections::HashMap;

use log::{debug, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bucket::{bucket_lazy, BmiBucket, BmiThresholds};
use crate::config::FilterConfig;
use crate::error::{EmptyResultWarning, Result};
use crate::records::{AGE, BMI, GLUCOSE, ID};

static BUCKET: &str = "bmi_bucket";
static COUNT: &str = "count";
static MEAN_GLUCOSE: &str = "mean_glucose";
static MEAN_AGE: &str = "mean_age";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub bucket: BmiBucket,
    pub count: u64,
    pub mean_glucose: Option<f64>,
    pub mean_age: Option<f64>,
}

impl BucketSummary {
    fn empty(bucket: BmiBucket) -> Self {
        BucketSummary {
            bucket,
            count: 0,
            mean_glucose: None,
            mean_age: None,
        }
    }
}

/// One row per bucket in BMI order. Buckets without members are kept with
/// a zero count and no means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub thresholds: BmiThresholds,
    pub buckets: Vec<BucketSummary>,
}

impl CohortSummary {
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn get(&self, bucket: BmiBucket) -> Option<&BucketSummary> {
        self.buckets.iter().find(|b| b.bucket == bucket)
    }

    pub fn populated(&self) -> impl Iterator<Item = &BucketSummary> {
        self.buckets.iter().filter(|b| b.count > 0)
    }

    pub fn empty_warning(&self) -> Option<EmptyResultWarning> {
        if self.total() == 0 {
            Some(EmptyResultWarning)
        } else {
            None
        }
    }
}

/// Optional pre-filters: minimum age and duplicate ids.
pub fn clean(frame: LazyFrame, filter: &FilterConfig) -> LazyFrame {
    let mut frame = frame;
    if let Some(min_age) = filter.min_age {
        frame = frame.filter(col(AGE).gt_eq(lit(min_age)));
    }
    if filter.drop_duplicate_ids {
        frame = frame.unique_stable(Some(vec![ID.to_string()]), UniqueKeepStrategy::First);
    }
    frame
}

/// Keeps the records whose bmi lies in `[bmi_min, bmi_max]`. Missing and
/// NaN values compare false and are dropped.
pub fn filter_valid(frame: LazyFrame, filter: &FilterConfig) -> LazyFrame {
    frame.filter(
        col(BMI)
            .gt_eq(lit(filter.bmi_min))
            .and(col(BMI).lt_eq(lit(filter.bmi_max))),
    )
}

pub fn summarize(
    frame: LazyFrame,
    filter: &FilterConfig,
    thresholds: &BmiThresholds,
) -> Result<CohortSummary> {
    let thresholds = *thresholds;

    let df = filter_valid(frame, filter)
        .with_column(
            col(BMI)
                .map(
                    move |s| bucket_lazy(s, thresholds),
                    GetOutput::from_type(DataType::Utf8),
                )
                .alias(BUCKET),
        )
        .groupby([col(BUCKET)])
        .agg([
            col(BMI).count().cast(DataType::UInt64).alias(COUNT),
            col(GLUCOSE).mean().alias(MEAN_GLUCOSE),
            col(AGE).mean().alias(MEAN_AGE),
        ])
        .collect()?;

    debug!("aggregated buckets\n{}", df);

    let labels = df.column(BUCKET)?.utf8()?;
    let counts = df.column(COUNT)?.u64()?;
    let glucose = df.column(MEAN_GLUCOSE)?.cast(&DataType::Float64)?;
    let glucose = glucose.f64()?;
    let ages = df.column(MEAN_AGE)?.cast(&DataType::Float64)?;
    let ages = ages.f64()?;

    let mut rows: HashMap<BmiBucket, BucketSummary> = HashMap::new();
    for i in 0..df.height() {
        let Some(bucket) = labels.get(i).and_then(BmiBucket::from_label) else {
            continue;
        };
        rows.insert(
            bucket,
            BucketSummary {
                bucket,
                count: counts.get(i).unwrap_or(0),
                mean_glucose: glucose.get(i),
                mean_age: ages.get(i),
            },
        );
    }

    let summary = CohortSummary {
        thresholds,
        buckets: BmiBucket::ALL
            .into_iter()
            .map(|b| rows.remove(&b).unwrap_or_else(|| BucketSummary::empty(b)))
            .collect(),
    };

    if let Some(warning) = summary.empty_warning() {
        warn!("{}", warning);
    }

    Ok(summary)
}
