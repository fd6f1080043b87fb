use std::fs::File;
use std::path::Path;

use log::{debug, info};
use polars::prelude::*;
use polars_io::parquet::ParquetWriter;

use crate::config::{ColumnNames, InputConfig};
use crate::error::{CohortError, InputError};
use crate::records::{AGE, BMI, GLUCOSE, ID};

static ROW_NUMBER: &str = "__row_number";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Parquet,
}

impl InputFormat {
    pub fn infer(path: &Path) -> Option<InputFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(InputFormat::Csv),
            "parquet" | "pq" => Some(InputFormat::Parquet),
            _ => None,
        }
    }
}

fn csv_reader<'a>(path: &Path, input: &InputConfig) -> LazyCsvReader<'a> {
    let null_values = if input.null_values.is_empty() {
        None
    } else {
        Some(NullValues::AllColumns(input.null_values.clone()))
    };

    LazyCsvReader::new(path)
        .has_header(true)
        .with_null_values(null_values)
        .with_infer_schema_length(Some(input.infer_schema_length))
}

/// Scans a CSV file with the configured columns typed up front: measures
/// as Float64 and the id as Utf8, whatever the first rows look like.
/// Columns absent from the header are left out of the overwrite so the
/// missing-column check still sees them as missing.
pub fn scan_csv<P: AsRef<Path>>(
    path: P,
    columns: &ColumnNames,
    input: &InputConfig,
) -> PolarsResult<LazyFrame> {
    let path = path.as_ref();
    let inferred = csv_reader(path, input).finish()?.schema()?;

    let dtypes = Schema::from_iter(
        [
            (columns.id.as_str(), DataType::Utf8),
            (columns.bmi.as_str(), DataType::Float64),
            (columns.glucose.as_str(), DataType::Float64),
            (columns.age.as_str(), DataType::Float64),
        ]
        .into_iter()
        .filter(|(name, _)| inferred.get(name).is_some())
        .map(|(name, dtype)| Field::new(name, dtype)),
    );

    csv_reader(path, input)
        .with_dtype_overwrite(Some(&dtypes))
        .finish()
}

pub fn scan_parquet<P: AsRef<Path>>(path: P) -> PolarsResult<LazyFrame> {
    LazyFrame::scan_parquet(path, ScanArgsParquet::default())
}

pub fn write_parquet(path: &Path, df: &mut DataFrame) -> Result<(), CohortError> {
    let mut file = File::create(path).map_err(|source| CohortError::Output {
        path: path.to_path_buf(),
        source,
    })?;

    ParquetWriter::new(&mut file).finish(df)?;

    Ok(())
}

/// Scans `path` lazily and projects it onto the canonical
/// `id, bmi, glucose, age` columns. Nothing is read beyond the schema
/// until the returned frame is collected; unparsable values surface then.
pub fn load(path: &Path, columns: &ColumnNames, input: &InputConfig) -> Result<LazyFrame, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let lf = match InputFormat::infer(path) {
        Some(InputFormat::Csv) => scan_csv(path, columns, input)?,
        Some(InputFormat::Parquet) => scan_parquet(path)?,
        None => {
            return Err(InputError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let schema = lf.schema()?;
    for column in columns.required() {
        if schema.get(column).is_none() {
            return Err(InputError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let (lf, id_column) = if schema.get(&columns.id).is_some() {
        (lf, columns.id.as_str())
    } else {
        debug!("no {:?} column in {}, using row numbers as ids", columns.id, path.display());
        (lf.with_row_count(ROW_NUMBER, None), ROW_NUMBER)
    };

    info!("Scanning {}", path.display());

    Ok(lf.select([
        col(id_column).cast(DataType::Utf8).alias(ID),
        col(&columns.bmi).strict_cast(DataType::Float64).alias(BMI),
        col(&columns.glucose).strict_cast(DataType::Float64).alias(GLUCOSE),
        col(&columns.age).strict_cast(DataType::Float64).alias(AGE),
    ]))
}

/// Writes the projected canonical columns of `input_path` to a Parquet
/// file. Returns the number of rows written.
pub fn convert_to_columnar(
    input_path: &Path,
    output_path: &Path,
    columns: &ColumnNames,
    input: &InputConfig,
) -> Result<usize, CohortError> {
    let mut df = load(input_path, columns, input)?
        .collect()
        .map_err(InputError::from)?;

    write_parquet(output_path, &mut df)?;
    info!(
        "Converted {} rows from {} to {}",
        df.height(),
        input_path.display(),
        output_path.display()
    );

    Ok(df.height())
}
