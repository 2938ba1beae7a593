use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type};
use arrow::error::ArrowError;
use arrow::temporal_conversions::date32_to_datetime;
use arrow::util::display::array_value_to_string;
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use thiserror::Error;

use super::model::{CellValue, Column, ColumnKind, Dataset, Record, DATE, REQUIRED_NUMERIC_COLUMNS};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal load failure. Nothing downstream may run once this is returned.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("cannot read parquet file {path}: {source}")]
    Parquet {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    #[error("cannot decode column '{column}' in {path}: {source}")]
    Arrow {
        path: PathBuf,
        column: String,
        #[source]
        source: ArrowError,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path}, row {row}: cannot parse date '{value}'")]
    BadDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("{path}: column '{column}' must be numeric but contains '{value}'")]
    NotNumeric {
        path: PathBuf,
        column: String,
        value: String,
    },

    #[error("{0} contains no data rows")]
    Empty(PathBuf),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file, bypassing the cache. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`             – comma-delimited with a header row
/// * `.tsv` / `.tab`    – tab-delimited with a header row
/// * `.parquet` / `.pq` – flat Parquet table
///
/// Use [`super::cache::load`] for the memoized variant.
pub fn load_file(path: &Path) -> Result<Dataset, DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_delimited(path, b',')?,
        "tsv" | "tab" => load_delimited(path, b'\t')?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(DataLoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.columns().iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Cell texts treated as missing values.
const NA_TOKENS: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

fn load_delimited(path: &Path, delimiter: u8) -> Result<Dataset, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| DataLoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(DataLoadError::Empty(path.to_path_buf()));
    }

    let date_idx = find_column(path, &headers, DATE)?;
    for required in REQUIRED_NUMERIC_COLUMNS {
        find_column(path, &headers, required)?;
    }

    let mut dates = Vec::new();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let date_text = record.get(date_idx).unwrap_or("");
        let date = parse_date(date_text).ok_or_else(|| DataLoadError::BadDate {
            path: path.to_path_buf(),
            row: row_no + 1,
            value: date_text.to_string(),
        })?;
        dates.push(date);

        for (col_idx, cells) in raw.iter_mut().enumerate() {
            if col_idx != date_idx {
                cells.push(record.get(col_idx).unwrap_or("").to_string());
            }
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .enumerate()
        .filter(|(i, _)| *i != date_idx)
        .map(|(_, (name, cells))| infer_column(name, cells))
        .collect();

    assemble(path, dates, columns)
}

fn find_column(path: &Path, headers: &[String], name: &str) -> Result<usize, DataLoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| DataLoadError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

/// Parse a date in any of the accepted textual layouts. Any time part is dropped.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn is_na(text: &str) -> bool {
    NA_TOKENS.contains(&text)
}

/// A column is numeric when every non-missing cell parses as a float.
fn infer_column(name: String, cells: Vec<String>) -> ColumnData {
    let numeric = cells
        .iter()
        .all(|s| is_na(s) || s.parse::<f64>().is_ok());

    let (kind, cells) = if numeric {
        let values = cells
            .iter()
            .map(|s| s.parse::<f64>().map_or(CellValue::Null, CellValue::Number))
            .collect();
        (ColumnKind::Numeric, values)
    } else {
        let values = cells
            .into_iter()
            .map(|s| if is_na(&s) { CellValue::Null } else { CellValue::Text(s) })
            .collect();
        (ColumnKind::Text, values)
    };

    ColumnData {
        column: Column { name, kind },
        cells,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table.
///
/// The `date` column may be `Date32`, `Date64`, a timestamp, or a string in
/// ISO layout. Numeric columns of any width are widened to `f64`; every other
/// type becomes a text column.
fn load_parquet(path: &Path) -> Result<Dataset, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parquet_err = |source| DataLoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let schema = Arc::clone(builder.schema());
    let reader = builder.build().map_err(parquet_err)?;

    let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let date_idx = find_column(path, &names, DATE)?;
    for required in REQUIRED_NUMERIC_COLUMNS {
        find_column(path, &names, required)?;
    }

    let mut columns: Vec<(usize, ColumnData)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx)
        .map(|(i, field)| {
            let kind = if field.data_type().is_numeric() {
                ColumnKind::Numeric
            } else {
                ColumnKind::Text
            };
            let column = Column {
                name: field.name().clone(),
                kind,
            };
            (i, ColumnData { column, cells: Vec::new() })
        })
        .collect();

    let mut dates = Vec::new();

    for batch_result in reader {
        let batch = batch_result.map_err(|source| DataLoadError::Arrow {
            path: path.to_path_buf(),
            column: DATE.to_string(),
            source,
        })?;

        extract_dates(path, batch.column(date_idx), &mut dates)?;
        for (col_idx, data) in &mut columns {
            extract_cells(path, batch.column(*col_idx), data)?;
        }
    }

    assemble(path, dates, columns.into_iter().map(|(_, c)| c).collect())
}

// -- Parquet / Arrow helpers --

fn extract_dates(
    path: &Path,
    col: &Arc<dyn Array>,
    dates: &mut Vec<NaiveDate>,
) -> Result<(), DataLoadError> {
    let arrow_err = |source| DataLoadError::Arrow {
        path: path.to_path_buf(),
        column: DATE.to_string(),
        source,
    };

    let as_date32 = cast(col, &DataType::Date32).map_err(arrow_err)?;
    let days = as_date32.as_primitive::<Date32Type>();

    for row in 0..days.len() {
        let date = if days.is_null(row) {
            None
        } else {
            date32_to_datetime(days.value(row)).map(|dt| dt.date())
        };
        match date {
            Some(d) => dates.push(d),
            None => {
                let value = array_value_to_string(col, row).map_err(arrow_err)?;
                return Err(DataLoadError::BadDate {
                    path: path.to_path_buf(),
                    row: dates.len() + 1,
                    value,
                });
            }
        }
    }
    Ok(())
}

fn extract_cells(
    path: &Path,
    col: &Arc<dyn Array>,
    data: &mut ColumnData,
) -> Result<(), DataLoadError> {
    let column = data.column.name.clone();
    let arrow_err = |source| DataLoadError::Arrow {
        path: path.to_path_buf(),
        column: column.clone(),
        source,
    };

    match data.column.kind {
        ColumnKind::Numeric => {
            let widened = cast(col, &DataType::Float64).map_err(arrow_err)?;
            let values = widened.as_primitive::<Float64Type>();
            data.cells.extend(values.iter().map(CellValue::from));
        }
        ColumnKind::Text => {
            for row in 0..col.len() {
                let cell = if col.is_null(row) {
                    CellValue::Null
                } else {
                    CellValue::Text(array_value_to_string(col, row).map_err(arrow_err)?)
                };
                data.cells.push(cell);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared assembly
// ---------------------------------------------------------------------------

struct ColumnData {
    column: Column,
    cells: Vec<CellValue>,
}

/// Validate the column set and transpose columns into row records.
fn assemble(
    path: &Path,
    dates: Vec<NaiveDate>,
    columns: Vec<ColumnData>,
) -> Result<Dataset, DataLoadError> {
    if dates.is_empty() {
        return Err(DataLoadError::Empty(path.to_path_buf()));
    }

    for required in REQUIRED_NUMERIC_COLUMNS {
        let Some(data) = columns.iter().find(|c| c.column.name == required) else {
            return Err(DataLoadError::MissingColumn {
                path: path.to_path_buf(),
                column: required.to_string(),
            });
        };
        if data.column.kind != ColumnKind::Numeric {
            let value = data
                .cells
                .iter()
                .find(|c| !c.is_missing())
                .map(|c| c.to_string())
                .unwrap_or_default();
            return Err(DataLoadError::NotNumeric {
                path: path.to_path_buf(),
                column: required.to_string(),
                value,
            });
        }
    }

    let schema: Vec<Column> = columns.iter().map(|c| c.column.clone()).collect();
    let mut cells: Vec<std::vec::IntoIter<CellValue>> =
        columns.into_iter().map(|c| c.cells.into_iter()).collect();

    let records = dates
        .into_iter()
        .map(|date| Record {
            date,
            values: cells
                .iter_mut()
                .map(|it| it.next().unwrap_or(CellValue::Null))
                .collect(),
        })
        .collect();

    Ok(Dataset::new(schema, records))
}
