//! Tabular loading and storage handles for the analysis service.

pub mod sources;
pub mod storage;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use sources::load_table;
pub use storage::{ArtifactStore, BlobStore, FsArtifactStore, FsBlobStore, MemoryBlobStore};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Parse(String),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                DataError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => DataError::Parse(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}
