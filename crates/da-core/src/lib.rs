//! Shared column-typing layer for the tabular analysis service.
//!
//! Hosts the pluggable type-inference strategy used by the loaders and the
//! array value-extraction helpers shared by the summary and plotting code.

pub mod extract;
pub mod infer;

pub use infer::{ColumnTypeInference, SampleInference};
