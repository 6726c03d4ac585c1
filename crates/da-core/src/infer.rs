//! Column type inference from raw string values.

use arrow::datatypes::{DataType, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime};

/// Strategy for inferring a column's arrow type from its raw values.
///
/// Loaders sample each column's cells as strings and delegate the typing
/// decision here, so the summary and rendering layers can be tested against
/// synthetic tables built with any strategy.
pub trait ColumnTypeInference: Send + Sync {
    /// Infer the type of a column from its non-empty sampled values.
    fn infer(&self, values: &[String]) -> DataType;
}

/// Default sampling heuristic.
///
/// Considers up to `sample_size` values per column. A column is typed as the
/// narrowest of Int64, Float64, Timestamp(ms) that every non-empty value
/// satisfies; otherwise Utf8. Numeric checks run before the timestamp
/// heuristic so negative integers are not mistaken for dashed dates.
pub struct SampleInference {
    sample_size: usize,
}

impl SampleInference {
    pub fn new() -> Self {
        Self { sample_size: 1000 }
    }

    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }
}

impl Default for SampleInference {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnTypeInference for SampleInference {
    fn infer(&self, values: &[String]) -> DataType {
        let mut is_int = true;
        let mut is_float = true;
        let mut is_timestamp = true;
        let mut seen_any = false;

        for value in values.iter().take(self.sample_size) {
            if value.is_empty() {
                continue;
            }
            seen_any = true;

            if is_int && value.parse::<i64>().is_err() {
                is_int = false;
            }
            if is_float && value.parse::<f64>().is_err() {
                is_float = false;
            }
            if is_timestamp && parse_timestamp_millis(value).is_none() {
                is_timestamp = false;
            }
        }

        // An all-empty column carries no type evidence.
        if !seen_any {
            return DataType::Utf8;
        }

        if is_int {
            DataType::Int64
        } else if is_float {
            DataType::Float64
        } else if is_timestamp {
            DataType::Timestamp(TimeUnit::Millisecond, None)
        } else {
            DataType::Utf8
        }
    }
}

/// Parse a cell as a timestamp, returning epoch milliseconds.
///
/// Accepts the date and datetime shapes commonly found in exported CSVs.
pub fn parse_timestamp_millis(value: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}
