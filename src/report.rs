//! Rendering of a [`CohortSummary`] as text, JSON or CSV.

use clap::ValueEnum;
use serde::Serialize;

use crate::bucket::BmiBucket;
use crate::error::{CohortError, Result};
use crate::pipeline::{BucketSummary, CohortSummary};

pub static NO_DATA: &str = "No data available: no records survived the BMI range filter.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Direction of mean age across ascending BMI buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeTrend {
    Rising,
    Falling,
    Flat,
    Mixed,
    InsufficientData,
}

impl AgeTrend {
    pub fn of(summary: &CohortSummary) -> AgeTrend {
        let ages: Vec<f64> = summary.populated().filter_map(|b| b.mean_age).collect();
        if ages.len() < 2 {
            return AgeTrend::InsufficientData;
        }

        let steps: Vec<f64> = ages.windows(2).map(|w| w[1] - w[0]).collect();
        if steps.iter().all(|d| *d == 0.0) {
            AgeTrend::Flat
        } else if steps.iter().all(|d| *d >= 0.0) {
            AgeTrend::Rising
        } else if steps.iter().all(|d| *d <= 0.0) {
            AgeTrend::Falling
        } else {
            AgeTrend::Mixed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub highest_glucose: Option<BmiBucket>,
    pub largest: Option<BmiBucket>,
    pub age_trend: AgeTrend,
}

impl Insights {
    /// Ties resolve to the lower BMI bucket.
    pub fn of(summary: &CohortSummary) -> Insights {
        let mut highest: Option<(BmiBucket, f64)> = None;
        let mut largest: Option<(BmiBucket, u64)> = None;

        for row in summary.populated() {
            if let Some(glucose) = row.mean_glucose {
                if highest.map_or(true, |(_, best)| glucose > best) {
                    highest = Some((row.bucket, glucose));
                }
            }
            if largest.map_or(true, |(_, best)| row.count > best) {
                largest = Some((row.bucket, row.count));
            }
        }

        Insights {
            highest_glucose: highest.map(|(b, _)| b),
            largest: largest.map(|(b, _)| b),
            age_trend: AgeTrend::of(summary),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    total: u64,
    buckets: &'a [BucketSummary],
    insights: Insights,
}

pub fn render(summary: &CohortSummary, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(report(summary)),
        ReportFormat::Json => render_json(summary),
        ReportFormat::Csv => render_csv(summary),
    }
}

pub fn render_json(summary: &CohortSummary) -> Result<String> {
    let doc = JsonReport {
        total: summary.total(),
        buckets: &summary.buckets,
        insights: Insights::of(summary),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn render_csv(summary: &CohortSummary) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in &summary.buckets {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| CohortError::Serialize {
        message: e.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn fmt_mean(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}

/// Human readable report: the per-bucket table followed by the insights.
pub fn report(summary: &CohortSummary) -> String {
    let mut output = String::new();

    output.push_str("# BMI cohort summary\n\n");

    if summary.empty_warning().is_some() {
        output.push_str(NO_DATA);
        output.push('\n');
        return output;
    }

    output.push_str(&format!("Records summarized: {}\n\n", summary.total()));
    output.push_str(&format!(
        "{:<12} {:>12} {:>7} {:>13} {:>9}\n",
        "Bucket", "BMI range", "Count", "Mean glucose", "Mean age"
    ));
    for row in &summary.buckets {
        output.push_str(&format!(
            "{:<12} {:>12} {:>7} {:>13} {:>9}\n",
            row.bucket.label(),
            summary.thresholds.range_label(row.bucket),
            row.count,
            fmt_mean(row.mean_glucose),
            fmt_mean(row.mean_age),
        ));
    }

    let insights = Insights::of(summary);
    output.push_str("\n## Insights\n\n");

    match insights.highest_glucose.and_then(|b| summary.get(b)) {
        Some(row) => output.push_str(&format!(
            "- Highest mean glucose: {} ({})\n",
            row.bucket,
            fmt_mean(row.mean_glucose)
        )),
        None => output.push_str("- Highest mean glucose: no glucose values recorded\n"),
    }

    if let Some(row) = insights.largest.and_then(|b| summary.get(b)) {
        let share = row.count as f64 / summary.total() as f64 * 100.0;
        output.push_str(&format!(
            "- Largest group: {} ({} patients, {:.1}% of the cohort)\n",
            row.bucket, row.count, share
        ));
    }

    let ages: Vec<String> = summary
        .populated()
        .filter_map(|b| b.mean_age.map(|a| format!("{} {:.1}", b.bucket, a)))
        .collect();
    let trend = match insights.age_trend {
        AgeTrend::Rising => "mean age rises with BMI category",
        AgeTrend::Falling => "mean age falls as BMI category rises",
        AgeTrend::Flat => "mean age is the same across BMI categories",
        AgeTrend::Mixed => "no consistent relation between mean age and BMI category",
        AgeTrend::InsufficientData => "not enough populated categories to compare",
    };
    if ages.is_empty() {
        output.push_str(&format!("- Age trend: {}\n", trend));
    } else {
        output.push_str(&format!("- Age trend: {} ({})\n", trend, ages.join(", ")));
    }

    output
}
