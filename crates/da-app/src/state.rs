//! Shared state for the analysis server.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;

use da_core::{ColumnTypeInference, SampleInference};
use da_data::{ArtifactStore, BlobStore};

/// Process-wide state shared by all handlers.
///
/// The storage handles are injected so tests can swap in isolated or
/// in-memory stores without changing the pipeline.
pub struct AppState {
    /// Upload storage keyed by filename. Last-write-wins on collisions.
    pub uploads: Arc<dyn BlobStore>,

    /// Rendered histogram storage, addressed by column name.
    pub artifacts: Arc<dyn ArtifactStore>,

    /// Column typing strategy used by the loaders.
    pub inference: Arc<dyn ColumnTypeInference>,

    pub started_at: Instant,
    pub total_requests: AtomicU64,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(uploads: Arc<dyn BlobStore>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self {
            uploads,
            artifacts,
            inference: Arc::new(SampleInference::new()),
            started_at: Instant::now(),
            total_requests: AtomicU64::new(0),
        }
    }
}
