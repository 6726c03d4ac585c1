//! File-format parsers producing arrow record batches.

pub mod csv_source;
pub mod xlsx_source;

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder, TimestampMillisecondBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use da_core::infer::{parse_timestamp_millis, ColumnTypeInference};

use crate::DataError;

pub use csv_source::read_csv;
pub use xlsx_source::read_xlsx;

/// Parse an uploaded file into a record batch, dispatching on its extension.
///
/// `.csv` goes through the delimited-text parser, `.xlsx` through the
/// spreadsheet parser; anything else fails with `UnsupportedFormat` before
/// any parsing is attempted.
pub fn load_table(
    filename: &str,
    bytes: &[u8],
    inference: &dyn ColumnTypeInference,
) -> Result<RecordBatch, DataError> {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".csv") {
        read_csv(bytes, inference)
    } else if lower.ends_with(".xlsx") {
        read_xlsx(bytes, inference)
    } else {
        tracing::debug!(filename, "rejected upload with unrecognized extension");
        Err(DataError::UnsupportedFormat(filename.to_string()))
    }
}

/// Build a record batch from string rows, typing each column via `inference`.
///
/// Empty cells and cells that fail to parse as the inferred type become
/// nulls. Duplicate header names are de-duplicated with a numeric suffix so
/// column names stay unique within the table.
pub(crate) fn build_batch(
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    inference: &dyn ColumnTypeInference,
) -> Result<RecordBatch, DataError> {
    if headers.is_empty() {
        return Err(DataError::Parse("no columns found in file".to_string()));
    }

    let headers = dedupe_headers(headers);

    let mut fields = Vec::with_capacity(headers.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());

    for (col_idx, name) in headers.iter().enumerate() {
        let samples: Vec<String> = rows
            .iter()
            .map(|row| row.get(col_idx).cloned().unwrap_or_default())
            .collect();
        let data_type = inference.infer(&samples);

        let array: ArrayRef = match &data_type {
            DataType::Int64 => {
                let mut builder = Int64Builder::new();
                for value in &samples {
                    match value.parse::<i64>() {
                        Ok(v) if !value.is_empty() => builder.append_value(v),
                        _ => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Float64 => {
                let mut builder = Float64Builder::new();
                for value in &samples {
                    match value.parse::<f64>() {
                        Ok(v) if !value.is_empty() => builder.append_value(v),
                        _ => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Timestamp(_, _) => {
                let mut builder = TimestampMillisecondBuilder::new();
                for value in &samples {
                    match parse_timestamp_millis(value) {
                        Some(ms) => builder.append_value(ms),
                        None => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            _ => {
                let mut builder = StringBuilder::new();
                for value in &samples {
                    if value.is_empty() {
                        builder.append_null();
                    } else {
                        builder.append_value(value);
                    }
                }
                Arc::new(builder.finish())
            }
        };

        fields.push(Field::new(name, array.data_type().clone(), true));
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, columns).map_err(|e| e.into())
}

/// Make header names unique by suffixing repeats with their occurrence index.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: ahash::AHashMap<String, usize> = ahash::AHashMap::new();
    headers
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name.clone()
            } else {
                format!("{}_{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}
