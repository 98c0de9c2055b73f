//! Retrieval traits

use crate::document::Chunk;
use crate::Result;
use async_trait::async_trait;

/// Text embedding provider
///
/// The same embedder must be used when building an index and when querying
/// it. `dimension()` is checked against persisted indexes at load time.
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Embed one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output vector dimension
    fn dimension(&self) -> usize;

    /// Model identifier recorded alongside persisted vectors
    fn model_name(&self) -> &str;
}

/// Read-only similarity search over embedded chunks
///
/// Implementations must be safe to query concurrently without locking.
#[async_trait]
pub trait SearchIndex: Send + Sync + 'static {
    /// Return up to `k` chunks, best match first
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>>;

    /// Number of stored chunks
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
