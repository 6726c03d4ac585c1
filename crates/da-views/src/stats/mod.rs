//! Per-column descriptive statistics.

use arrow::record_batch::RecordBatch;
use da_core::extract;
use indexmap::IndexMap;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for one numeric column.
///
/// Field names mirror the describe-style output the analyst client expects;
/// the quartile keys serialize as `"25%"`, `"50%"` and `"75%"`.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub count: u64,
    pub mean: f64,
    /// Sample standard deviation (n − 1). `None` when fewer than two
    /// non-null values exist, which serializes as JSON null.
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q1: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q3: f64,
    pub max: f64,
}

/// The result of summarizing a table.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// Statistics for each numeric column, in schema order.
    pub statistics: IndexMap<String, ColumnSummary>,
    /// Every column name, numeric or not, in schema order.
    pub columns: Vec<String>,
}

/// Compute descriptive statistics for every numeric column of a table.
///
/// Non-numeric columns are excluded from the statistics mapping but still
/// appear in the column list. Never fails: degenerate columns (all null,
/// single value) produce NaN/None statistics rather than errors.
pub fn summarize(batch: &RecordBatch) -> SummaryReport {
    let mut statistics = IndexMap::new();
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (idx, field) in batch.schema().fields().iter().enumerate() {
        columns.push(field.name().clone());

        if !extract::is_numeric(field.data_type()) {
            continue;
        }
        let Some(values) = extract::numeric_values(batch.column(idx).as_ref()) else {
            continue;
        };

        statistics.insert(field.name().clone(), describe(&values));
    }

    tracing::debug!(
        columns = columns.len(),
        numeric = statistics.len(),
        "summarized table"
    );
    SummaryReport { statistics, columns }
}

/// Describe one column's non-null values.
fn describe(values: &[f64]) -> ColumnSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let std = if values.len() < 2 {
        None
    } else {
        Some(values.iter().std_dev())
    };

    ColumnSummary {
        count: values.len() as u64,
        mean: values.iter().mean(),
        std,
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q1: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.50),
        q3: percentile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = p * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}
