//! Knowledge Base Loader
//!
//! Loads the `.txt` corpus for the offline index build: every text file
//! directly inside the source directory becomes one normalized Document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use voice_agent_core::{Document, Embedder};
use voice_agent_text_processing::TextNormalizer;

use crate::chunker::ChunkSplitter;
use crate::vector_store::VectorIndex;
use crate::RagError;

/// Counts reported after an index build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBuildStats {
    pub documents: usize,
    pub chunks: usize,
}

/// Corpus loader
pub struct KnowledgeLoader;

impl KnowledgeLoader {
    /// Load and normalize every `*.txt` file in `dir`, in file-name order.
    ///
    /// A missing directory or a non-UTF-8 file is an error; other entries
    /// are skipped.
    pub async fn load_directory(
        dir: &Path,
        normalizer: &TextNormalizer,
    ) -> Result<Vec<Document>, RagError> {
        let mut paths: Vec<PathBuf> = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_txt = path.extension().and_then(|e| e.to_str()) == Some("txt");
            if is_txt && entry.file_type().await?.is_file() {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = tokio::fs::read_to_string(&path).await?;
            let content = normalizer.normalize(&raw);
            tracing::debug!(
                path = %path.display(),
                chars = content.chars().count(),
                "Loaded document"
            );
            documents.push(Document::new(content, path.display().to_string()));
        }

        tracing::info!(
            dir = %dir.display(),
            documents = documents.len(),
            "Loaded knowledge documents"
        );
        Ok(documents)
    }

    /// Load, split and embed the corpus in `dir`.
    ///
    /// Nothing is persisted here; the caller saves the returned index only
    /// when the whole build succeeded.
    pub async fn build_index(
        dir: &Path,
        splitter: &ChunkSplitter,
        embedder: Arc<dyn Embedder>,
    ) -> Result<(VectorIndex, IndexBuildStats), RagError> {
        let documents = Self::load_directory(dir, &TextNormalizer::new()).await?;
        let chunks = splitter.split(&documents);
        let stats = IndexBuildStats {
            documents: documents.len(),
            chunks: chunks.len(),
        };

        tracing::info!(
            documents = stats.documents,
            chunks = stats.chunks,
            chunk_size = splitter.chunk_size(),
            chunk_overlap = splitter.chunk_overlap(),
            "Embedding chunks"
        );

        let index = VectorIndex::build(chunks, embedder).await?;
        Ok((index, stats))
    }
}
