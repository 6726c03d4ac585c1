//! Helpers for pulling typed values out of arrow arrays.

use arrow::array::{
    Array, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, Int8Array,
    StringArray, TimestampMillisecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::DataType;

/// True if the column's type participates in numeric summaries.
///
/// Timestamps count as numeric: their millisecond values are well ordered
/// and summarize meaningfully alongside the number columns.
pub fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Timestamp(_, _)
    )
}

/// Extract the non-null values of a numeric column as f64.
///
/// Returns `None` for non-numeric array types.
pub fn numeric_values(array: &dyn Array) -> Option<Vec<f64>> {
    macro_rules! collect {
        ($ty:ty) => {{
            let array = array.as_any().downcast_ref::<$ty>()?;
            Some(
                (0..array.len())
                    .filter_map(|i| {
                        if array.is_null(i) {
                            None
                        } else {
                            Some(array.value(i) as f64)
                        }
                    })
                    .collect(),
            )
        }};
    }

    match array.data_type() {
        DataType::Float64 => collect!(Float64Array),
        DataType::Float32 => collect!(Float32Array),
        DataType::Int64 => collect!(Int64Array),
        DataType::Int32 => collect!(Int32Array),
        DataType::Int16 => collect!(Int16Array),
        DataType::Int8 => collect!(Int8Array),
        DataType::UInt64 => collect!(UInt64Array),
        DataType::UInt32 => collect!(UInt32Array),
        DataType::UInt16 => collect!(UInt16Array),
        DataType::UInt8 => collect!(UInt8Array),
        DataType::Timestamp(_, _) => collect!(TimestampMillisecondArray),
        _ => None,
    }
}

/// Extract the non-null values of a column as display strings.
///
/// Used for categorical binning when a column is not numeric.
pub fn string_values(array: &dyn Array) -> Vec<String> {
    if let Some(strings) = array.as_any().downcast_ref::<StringArray>() {
        (0..strings.len())
            .filter_map(|i| {
                if strings.is_null(i) {
                    None
                } else {
                    Some(strings.value(i).to_string())
                }
            })
            .collect()
    } else if let Some(values) = numeric_values(array) {
        values.iter().map(|v| v.to_string()).collect()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn extracts_floats_skipping_nulls() {
        let array = Float64Array::from(vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(numeric_values(&array), Some(vec![1.0, 3.0]));
    }

    #[test]
    fn extracts_ints_as_f64() {
        let array = Int64Array::from(vec![1, 2, 3]);
        assert_eq!(numeric_values(&array), Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn strings_are_not_numeric() {
        let array = StringArray::from(vec!["a", "b"]);
        assert!(numeric_values(&array).is_none());
        assert!(!is_numeric(array.data_type()));
    }

    #[test]
    fn string_values_skip_nulls() {
        let array: Arc<dyn Array> = Arc::new(StringArray::from(vec![Some("x"), None, Some("y")]));
        assert_eq!(string_values(array.as_ref()), vec!["x", "y"]);
    }
}
