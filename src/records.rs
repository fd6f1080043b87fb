use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub static ID: &str = "id";
pub static BMI: &str = "bmi";
pub static GLUCOSE: &str = "glucose";
pub static AGE: &str = "age";

/// One patient row after projection onto the canonical columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: String,
    pub bmi: f64,
    pub glucose: Option<f64>,
    pub age: Option<f64>,
}

impl PatientRecord {
    pub fn new(id: impl ToString, bmi: f64, glucose: f64, age: f64) -> Self {
        PatientRecord {
            id: id.to_string(),
            bmi,
            glucose: Some(glucose),
            age: Some(age),
        }
    }

    pub fn canonical_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(ID, DataType::Utf8),
            Field::new(BMI, DataType::Float64),
            Field::new(GLUCOSE, DataType::Float64),
            Field::new(AGE, DataType::Float64),
        ])
    }
}

/// Builds a canonical frame from in-memory records.
pub fn records_to_frame(records: &[PatientRecord]) -> PolarsResult<DataFrame> {
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    let bmis: Vec<f64> = records.iter().map(|r| r.bmi).collect();
    let glucose: Vec<Option<f64>> = records.iter().map(|r| r.glucose).collect();
    let ages: Vec<Option<f64>> = records.iter().map(|r| r.age).collect();

    df!(
        ID => ids,
        BMI => bmis,
        GLUCOSE => glucose,
        AGE => ages
    )
}

/// Materializes a canonical frame. Rows without a bmi or id are skipped,
/// they can never belong to a bucket.
pub fn collect_records(frame: LazyFrame) -> PolarsResult<Vec<PatientRecord>> {
    let df = frame.select([col(ID), col(BMI), col(GLUCOSE), col(AGE)]).collect()?;

    let ids = df.column(ID)?.cast(&DataType::Utf8)?;
    let bmis = df.column(BMI)?.cast(&DataType::Float64)?;
    let glucose = df.column(GLUCOSE)?.cast(&DataType::Float64)?;
    let ages = df.column(AGE)?.cast(&DataType::Float64)?;

    let records = ids
        .utf8()?
        .into_iter()
        .zip(bmis.f64()?.into_iter())
        .zip(glucose.f64()?.into_iter())
        .zip(ages.f64()?.into_iter())
        .filter_map(|(((id, bmi), glucose), age)| {
            Some(PatientRecord {
                id: id?.to_string(),
                bmi: bmi?,
                glucose,
                age,
            })
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_has_canonical_schema() {
        let df = records_to_frame(&[PatientRecord::new(1, 22.0, 90.0, 30.0)]).unwrap();
        let expected: Vec<DataType> = PatientRecord::canonical_schema()
            .iter_dtypes()
            .cloned()
            .collect();
        assert_eq!(df.dtypes(), expected);
        assert_eq!(df.get_column_names(), &[ID, BMI, GLUCOSE, AGE]);
    }

    #[test]
    fn records_survive_a_trip_through_the_frame() {
        let records = vec![
            PatientRecord::new(7, 31.5, 140.2, 61.0),
            PatientRecord {
                id: "P008".to_string(),
                bmi: 19.0,
                glucose: None,
                age: Some(0.64),
            },
        ];
        let df = records_to_frame(&records).unwrap();
        assert_eq!(collect_records(df.lazy()).unwrap(), records);
    }

    #[test]
    fn empty_records_give_an_empty_frame() {
        let df = records_to_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert!(collect_records(df.lazy()).unwrap().is_empty());
    }
}
