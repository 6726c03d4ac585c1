//! Summary statistics and histogram rendering over loaded tables.

pub mod plots;
pub mod stats;

use thiserror::Error;

// Re-exports
pub use plots::histogram::{render_histogram, HistogramConfig};
pub use stats::{summarize, ColumnSummary, SummaryReport};

/// Errors that can occur while rendering a view
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("plot error: {0}")]
    Plot(String),
}
