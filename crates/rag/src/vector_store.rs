//! Flat Vector Index
//!
//! Exact nearest-neighbour search over chunk embeddings. The index is built
//! offline, saved to a directory, and loaded read-only at startup:
//!
//! ```text
//! <path>/index.json   format version, metric, dimension, model, ordered chunks
//! <path>/vectors.bin  embeddings in chunk order, little-endian f32
//! ```
//!
//! The distance metric is chosen at build time and persisted, so queries
//! always use the metric the vectors were built for. Saving stages both
//! files in a sibling directory and renames it over `<path>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use voice_agent_core::{Chunk, Embedder, SearchIndex};

use crate::similarity::{blob_to_vec, cosine_similarity, euclidean_distance, vec_to_blob};
use crate::RagError;

/// Metadata file name inside an index directory
pub const INDEX_FILE: &str = "index.json";

/// Vector file name inside an index directory
pub const VECTORS_FILE: &str = "vectors.bin";

/// Current on-disk format version
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Distance metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDistance {
    /// `1 - cosine_similarity`
    #[default]
    Cosine,
    /// L2 distance
    Euclidean,
}

impl VectorDistance {
    /// Smaller is closer
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            VectorDistance::Cosine => 1.0 - cosine_similarity(a, b),
            VectorDistance::Euclidean => euclidean_distance(a, b),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexManifest {
    version: u32,
    metric: VectorDistance,
    dimension: usize,
    model: String,
    chunks: Vec<Chunk>,
}

/// In-memory vector index
///
/// Never mutated after construction, so `&self` queries are safe from any
/// number of tasks. Rebuilds produce a new index that callers swap in.
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
    model: String,
    distance: VectorDistance,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("chunks", &self.chunks.len())
            .field("dimension", &self.dimension)
            .field("model", &self.model)
            .field("distance", &self.distance)
            .finish()
    }
}

impl VectorIndex {
    /// Embed every chunk (order preserved) with cosine distance
    pub async fn build(chunks: Vec<Chunk>, embedder: Arc<dyn Embedder>) -> Result<Self, RagError> {
        Self::build_with_distance(chunks, embedder, VectorDistance::Cosine).await
    }

    /// Embed every chunk with an explicit metric.
    ///
    /// Any embedding failure aborts the build; no partial index is returned.
    pub async fn build_with_distance(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        distance: VectorDistance,
    ) -> Result<Self, RagError> {
        let dimension = embedder.dimension();
        let mut vectors = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let vector = embedder
                .embed(&chunk.content)
                .await
                .map_err(RagError::from_embedder)?;
            if vector.len() != dimension {
                return Err(RagError::Embedding(format!(
                    "chunk {} embedded to {} dimensions, expected {}",
                    i,
                    vector.len(),
                    dimension
                )));
            }
            vectors.push(vector);
        }

        tracing::info!(
            chunks = chunks.len(),
            dimension,
            model = embedder.model_name(),
            "Built vector index"
        );

        Ok(Self {
            chunks,
            vectors,
            dimension,
            model: embedder.model_name().to_string(),
            distance,
            embedder,
        })
    }

    /// Write the index to `path`, replacing any index already there
    ///
    /// A concurrent [`load`](Self::load) sees the old index, the new one, or
    /// no index at all, never a mix of the two.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RagError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let manifest = IndexManifest {
            version: INDEX_FORMAT_VERSION,
            metric: self.distance,
            dimension: self.dimension,
            model: self.model.clone(),
            chunks: self.chunks.clone(),
        };
        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| RagError::Search(format!("Failed to serialize index: {}", e)))?;

        let mut blob = Vec::with_capacity(self.vectors.len() * self.dimension * 4);
        for vector in &self.vectors {
            blob.extend(vec_to_blob(vector));
        }

        // removed on drop if anything below fails
        let staging = tempfile::Builder::new()
            .prefix(".index-staging-")
            .tempdir_in(&parent)?;
        std::fs::write(staging.path().join(INDEX_FILE), json)?;
        std::fs::write(staging.path().join(VECTORS_FILE), blob)?;
        replace_dir(staging.path(), path, &parent)?;

        tracing::info!(
            path = %path.display(),
            chunks = self.chunks.len(),
            "Saved vector index"
        );
        Ok(())
    }

    /// Load an index saved by [`VectorIndex::save`].
    ///
    /// `embedder` is only used for future queries; stored vectors are read
    /// back as-is. Any unreadable or mismatched state is `CorruptIndex`.
    pub fn load(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self, RagError> {
        let path = path.as_ref();
        let index_file = path.join(INDEX_FILE);
        let vectors_file = path.join(VECTORS_FILE);

        let json = std::fs::read(&index_file).map_err(|e| {
            RagError::CorruptIndex(format!("cannot read {}: {}", index_file.display(), e))
        })?;
        let manifest: IndexManifest = serde_json::from_slice(&json).map_err(|e| {
            RagError::CorruptIndex(format!("cannot parse {}: {}", index_file.display(), e))
        })?;

        if manifest.version != INDEX_FORMAT_VERSION {
            return Err(RagError::CorruptIndex(format!(
                "unsupported index version {} (expected {})",
                manifest.version, INDEX_FORMAT_VERSION
            )));
        }

        if manifest.dimension != embedder.dimension() {
            return Err(RagError::CorruptIndex(format!(
                "index dimension {} does not match embedder dimension {}",
                manifest.dimension,
                embedder.dimension()
            )));
        }

        let blob = std::fs::read(&vectors_file).map_err(|e| {
            RagError::CorruptIndex(format!("cannot read {}: {}", vectors_file.display(), e))
        })?;
        let expected = manifest.chunks.len() * manifest.dimension * 4;
        if blob.len() != expected {
            return Err(RagError::CorruptIndex(format!(
                "{} holds {} bytes, expected {}",
                vectors_file.display(),
                blob.len(),
                expected
            )));
        }

        let vectors: Vec<Vec<f32>> = if manifest.dimension == 0 {
            vec![Vec::new(); manifest.chunks.len()]
        } else {
            blob.chunks_exact(manifest.dimension * 4)
                .map(blob_to_vec)
                .collect()
        };

        if manifest.model != embedder.model_name() {
            tracing::warn!(
                index_model = %manifest.model,
                embedder_model = embedder.model_name(),
                "Index was built with a different embedding model"
            );
        }

        tracing::info!(
            path = %path.display(),
            chunks = manifest.chunks.len(),
            dimension = manifest.dimension,
            metric = ?manifest.metric,
            "Loaded vector index"
        );

        Ok(Self {
            chunks: manifest.chunks,
            vectors,
            dimension: manifest.dimension,
            model: manifest.model,
            distance: manifest.metric,
            embedder,
        })
    }

    /// Best `k` chunks with their distances, closest first.
    ///
    /// Ties keep chunk order. `k` larger than the index returns everything.
    pub async fn query_with_distances(
        &self,
        text: &str,
        k: usize,
    ) -> Result<Vec<(Chunk, f32)>, RagError> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query = self
            .embedder
            .embed(text)
            .await
            .map_err(RagError::from_embedder)?;
        if query.len() != self.dimension {
            return Err(RagError::Embedding(format!(
                "query embedded to {} dimensions, index has {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let d = self.distance.distance(&query, v);
                (i, if d.is_nan() { f32::INFINITY } else { d })
            })
            .collect();

        // stable: equal distances keep chunk order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, d)| (self.chunks[i].clone(), d))
            .collect())
    }

    /// Best `k` chunks, closest first
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>, RagError> {
        Ok(self
            .query_with_distances(text, k)
            .await?
            .into_iter()
            .map(|(chunk, _)| chunk)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn distance(&self) -> VectorDistance {
        self.distance
    }

    /// Embedding model recorded at build time
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

#[async_trait]
impl SearchIndex for VectorIndex {
    async fn query(&self, text: &str, k: usize) -> voice_agent_core::Result<Vec<Chunk>> {
        Ok(VectorIndex::query(self, text, k).await?)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}


/// Rename `staged` to `target`, retiring a previous directory at `target`
fn replace_dir(staged: &Path, target: &Path, parent: &Path) -> std::io::Result<()> {
    if !target.exists() {
        return std::fs::rename(staged, target);
    }

    // deleted with its contents when dropped
    let retired = tempfile::Builder::new()
        .prefix(".index-retired-")
        .tempdir_in(parent)?;
    let old = retired.path().join("index");
    std::fs::rename(target, &old)?;

    if let Err(e) = std::fs::rename(staged, target) {
        if let Err(restore) = std::fs::rename(&old, target) {
            tracing::error!(
                path = %target.display(),
                error = %restore,
                "Failed to restore previous index"
            );
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::split;
    use crate::embeddings::SimpleEmbedder;
    use voice_agent_core::Document;

    /// Embeds "x,y" strings to the literal 2-d vector
    struct PointEmbedder;

    #[async_trait]
    impl Embedder for PointEmbedder {
        async fn embed(&self, text: &str) -> voice_agent_core::Result<Vec<f32>> {
            let parts: Vec<f32> = text
                .split(',')
                .map(|p| p.trim().parse::<f32>().unwrap_or(0.0))
                .collect();
            Ok(parts)
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "point"
        }
    }

    struct FailingEmbedder {
        fail_on: &'static str,
    }

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, text: &str) -> voice_agent_core::Result<Vec<f32>> {
            if text == self.fail_on {
                return Err(voice_agent_core::Error::EmbeddingService(
                    "rate limited".to_string(),
                ));
            }
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn point_chunks(points: &[&str]) -> Vec<Chunk> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| Chunk {
                content: p.to_string(),
                metadata: Default::default(),
                position: i,
                start_char: 0,
                end_char: p.chars().count(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_index_query() {
        let index = VectorIndex::build(Vec::new(), Arc::new(PointEmbedder))
            .await
            .unwrap();
        assert!(index.is_empty());
        assert!(index.query("1,0", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_orders_by_cosine_distance() {
        let chunks = point_chunks(&["0,1", "1,0", "1,1", "-1,0"]);
        let index = VectorIndex::build(chunks, Arc::new(PointEmbedder))
            .await
            .unwrap();

        let results = index.query("1,0.1", 2).await.unwrap();
        let contents: Vec<_> = results.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["1,0", "1,1"]);
    }

    #[tokio::test]
    async fn test_ties_keep_chunk_order() {
        // "2,0" and "1,0" have identical cosine distance to any query
        let chunks = point_chunks(&["0,1", "2,0", "1,0"]);
        let index = VectorIndex::build(chunks, Arc::new(PointEmbedder))
            .await
            .unwrap();

        let results = index.query("5,0", 2).await.unwrap();
        assert_eq!(results[0].content, "2,0");
        assert_eq!(results[1].content, "1,0");
    }

    #[tokio::test]
    async fn test_k_larger_than_index() {
        let chunks = point_chunks(&["0,1", "1,0"]);
        let index = VectorIndex::build(chunks, Arc::new(PointEmbedder))
            .await
            .unwrap();

        let results = index.query("0,1", 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "0,1");
        assert!(index.query("0,1", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_euclidean_metric() {
        let chunks = point_chunks(&["10,0", "1,0"]);
        let index = VectorIndex::build_with_distance(
            chunks,
            Arc::new(PointEmbedder),
            VectorDistance::Euclidean,
        )
        .await
        .unwrap();

        let results = index.query("2,0", 1).await.unwrap();
        assert_eq!(results[0].content, "1,0");
    }

    #[tokio::test]
    async fn test_build_fails_atomically() {
        let chunks = point_chunks(&["a", "b", "c"]);
        let result = VectorIndex::build(chunks, Arc::new(FailingEmbedder { fail_on: "b" })).await;
        match result {
            Err(RagError::Embedding(msg)) => assert_eq!(msg, "rate limited"),
            other => panic!("expected embedding error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_dimension_rejected_at_build() {
        let chunks = point_chunks(&["1,2,3"]);
        let result = VectorIndex::build(chunks, Arc::new(PointEmbedder)).await;
        assert!(matches!(result, Err(RagError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vector_store");
        let embedder: Arc<dyn Embedder> = Arc::new(SimpleEmbedder::new(64));

        let docs = vec![
            Document::new("the museum opens at nine in the morning", "hours.txt"),
            Document::new("the mixed reality zone has interactive exhibits", "zones.txt"),
        ];
        let chunks = split(&docs, 20, 5).unwrap();
        let index = VectorIndex::build(chunks, embedder.clone()).await.unwrap();
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path, embedder).unwrap();
        assert_eq!(loaded.len(), index.len());
        assert_eq!(loaded.distance(), VectorDistance::Cosine);

        for question in ["when does the museum open", "mixed reality", "ticket"] {
            let before = index.query(question, 3).await.unwrap();
            let after = loaded.query(question, 3).await.unwrap();
            assert_eq!(before, after);
        }
    }

    #[tokio::test]
    async fn test_resave_replaces_index_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vector_store");

        let first = VectorIndex::build(point_chunks(&["1,0", "0,1"]), Arc::new(PointEmbedder))
            .await
            .unwrap();
        first.save(&path).unwrap();

        let second = VectorIndex::build(
            point_chunks(&["1,1", "2,0", "0,3"]),
            Arc::new(PointEmbedder),
        )
        .await
        .unwrap();
        second.save(&path).unwrap();

        let loaded = VectorIndex::load(&path, Arc::new(PointEmbedder)).unwrap();
        assert_eq!(loaded.len(), 3);
        let results = loaded.query("0,1", 1).await.unwrap();
        assert_eq!(results[0].content, "0,3");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("vector_store")]);
    }

    #[tokio::test]
    async fn test_load_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::build(point_chunks(&["1,0"]), Arc::new(PointEmbedder))
            .await
            .unwrap();
        index.save(dir.path()).unwrap();

        let result = VectorIndex::load(dir.path(), Arc::new(SimpleEmbedder::new(8)));
        assert!(matches!(result, Err(RagError::CorruptIndex(_))));
    }

    #[tokio::test]
    async fn test_load_truncated_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::build(point_chunks(&["1,0", "0,1"]), Arc::new(PointEmbedder))
            .await
            .unwrap();
        index.save(dir.path()).unwrap();
        std::fs::write(dir.path().join(VECTORS_FILE), [0u8; 7]).unwrap();

        let result = VectorIndex::load(dir.path(), Arc::new(PointEmbedder));
        assert!(matches!(result, Err(RagError::CorruptIndex(_))));
    }

    #[test]
    fn test_load_missing_or_garbage() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            VectorIndex::load(dir.path(), Arc::new(PointEmbedder)),
            Err(RagError::CorruptIndex(_))
        ));

        std::fs::write(dir.path().join(INDEX_FILE), b"not json").unwrap();
        assert!(matches!(
            VectorIndex::load(dir.path(), Arc::new(PointEmbedder)),
            Err(RagError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_load_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(INDEX_FILE),
            r#"{"version":99,"metric":"cosine","dimension":2,"model":"point","chunks":[]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(VECTORS_FILE), b"").unwrap();

        assert!(matches!(
            VectorIndex::load(dir.path(), Arc::new(PointEmbedder)),
            Err(RagError::CorruptIndex(_))
        ));
    }
}
