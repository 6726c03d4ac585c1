//! Delimited-text parsing into arrow record batches.

use arrow::record_batch::RecordBatch;
use csv::ReaderBuilder;
use da_core::infer::ColumnTypeInference;

use crate::DataError;

/// Parse CSV bytes into a record batch.
///
/// The first record is taken as the header row; column types come from the
/// injected inference strategy. Ragged or otherwise malformed records fail
/// with a `Parse` error carrying the csv crate's message.
pub fn read_csv(bytes: &[u8], inference: &dyn ColumnTypeInference) -> Result<RecordBatch, DataError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    tracing::debug!(columns = headers.len(), rows = rows.len(), "parsed csv upload");
    super::build_batch(headers, rows, inference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, TimeUnit};
    use da_core::SampleInference;

    fn parse(bytes: &[u8]) -> RecordBatch {
        read_csv(bytes, &SampleInference::new()).unwrap()
    }

    #[test]
    fn parses_headers_in_order() {
        let batch = parse(b"name,age,score\nalice,30,1.5\nbob,25,2.0\n");
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["name", "age", "score"]);
        assert_eq!(batch.num_rows(), 2);
    }

    #[test]
    fn infers_column_types() {
        let batch = parse(b"name,age,score,day\nalice,30,1.5,2023-01-05\n");
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(
            schema.field(3).data_type(),
            &DataType::Timestamp(TimeUnit::Millisecond, None)
        );
    }

    #[test]
    fn empty_cells_become_nulls() {
        let batch = parse(b"x,y\n1,\n3,4\n");
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(0).null_count(), 0);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn ragged_rows_fail_with_parse_error() {
        let err = read_csv(b"a,b\n1\n", &SampleInference::new()).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }

    #[test]
    fn header_only_file_yields_empty_batch() {
        let batch = parse(b"a,b\n");
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }
}
