//! Spreadsheet parsing into arrow record batches.

use std::io::Cursor;

use arrow::record_batch::RecordBatch;
use calamine::{Data, Reader, Xlsx};
use da_core::infer::ColumnTypeInference;

use crate::DataError;

/// Parse XLSX bytes into a record batch.
///
/// Reads the first worksheet, takes its first row as headers and routes the
/// remaining cells through the same stringify-then-infer path as the CSV
/// parser so both formats produce identically typed tables.
pub fn read_xlsx(bytes: &[u8], inference: &dyn ColumnTypeInference) -> Result<RecordBatch, DataError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| DataError::Parse(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataError::Parse("workbook contains no worksheets".to_string()))?
        .map_err(|e| DataError::Parse(e.to_string()))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .map(|row| row.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let rows: Vec<Vec<String>> = rows_iter
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    tracing::debug!(columns = headers.len(), rows = rows.len(), "parsed xlsx upload");
    super::build_batch(headers, rows, inference)
}

/// Render a spreadsheet cell the way it would appear in an exported CSV.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        // Cell-level spreadsheet errors (#DIV/0! and friends) become nulls.
        Data::Error(_) => String::new(),
    }
}
