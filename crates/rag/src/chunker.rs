//! Fixed-window Text Chunking
//!
//! Splits normalized documents into windows of `chunk_size` characters,
//! stepping by `chunk_size - chunk_overlap`, so neighbours share exactly
//! `chunk_overlap` characters. Offsets are counted in characters (Unicode
//! scalar values), never bytes.
//!
//! # Usage
//!
//! ```
//! use voice_agent_core::Document;
//! use voice_agent_rag::ChunkSplitter;
//!
//! let splitter = ChunkSplitter::new(4, 1).unwrap();
//! let chunks = splitter.split(&[Document::new("abcdefghij", "a.txt")]);
//! let texts: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
//! assert_eq!(texts, ["abcd", "defg", "ghij"]);
//! ```

use voice_agent_config::constants::rag;
use voice_agent_core::{Chunk, Document};

use crate::RagError;

/// Character-window splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self {
            chunk_size: rag::CHUNK_SIZE,
            chunk_overlap: rag::CHUNK_OVERLAP,
        }
    }
}

impl ChunkSplitter {
    /// Create a splitter, rejecting `chunk_overlap >= chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::Configuration(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Split documents in order; chunks of one document stay contiguous
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }

    /// Split one document. Empty content yields no chunks.
    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = document.content.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            chunks.push(Chunk {
                content: chars[start..end].iter().collect(),
                metadata: document.metadata.clone(),
                position: chunks.len(),
                start_char: start,
                end_char: end,
            });
            if end == total {
                break;
            }
            start += self.step();
        }

        chunks
    }
}

/// Validate parameters and split in one call
pub fn split(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>, RagError> {
    Ok(ChunkSplitter::new(chunk_size, chunk_overlap)?.split(documents))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            out.extend(chunk.content.chars().skip(skip));
        }
        out
    }

    #[test]
    fn test_overlap_must_be_smaller() {
        assert!(matches!(
            ChunkSplitter::new(10, 10),
            Err(RagError::Configuration(_))
        ));
        assert!(matches!(
            split(&[], 5, 7),
            Err(RagError::Configuration(_))
        ));
        assert!(ChunkSplitter::new(0, 0).is_err());
    }

    #[test]
    fn test_windows_and_overlap() {
        let content: String = ('a'..='z').collect();
        let doc = Document::new(content.clone(), "alphabet.txt");

        for (size, overlap) in [(5, 0), (5, 2), (7, 3), (26, 5), (30, 10), (3, 2)] {
            let chunks = split(&[doc.clone()], size, overlap).unwrap();

            for chunk in &chunks {
                assert!(chunk.content.chars().count() <= size);
            }
            for pair in chunks.windows(2) {
                let left: Vec<char> = pair[0].content.chars().collect();
                let right: Vec<char> = pair[1].content.chars().collect();
                assert_eq!(left[left.len() - overlap..], right[..overlap]);
            }
            assert_eq!(reconstruct(&chunks, overlap), content);
        }
    }

    #[test]
    fn test_thai_counted_by_characters() {
        let doc = Document::new("พิพิธภัณฑ์ไทย", "th.txt");
        let chunks = split(&[doc.clone()], 4, 1).unwrap();
        assert_eq!(chunks[0].content, "พิพิ");
        assert_eq!(chunks[0].char_len(), 4);
        assert_eq!(reconstruct(&chunks, 1), doc.content);
    }

    #[test]
    fn test_metadata_and_order() {
        let docs = vec![
            Document::new("aaaaaa", "a.txt"),
            Document::new("bbbbbb", "b.txt").with_metadata("lang", "en"),
        ];
        let chunks = split(&docs, 4, 2).unwrap();

        let sources: Vec<_> = chunks.iter().map(|c| c.source().unwrap()).collect();
        assert_eq!(sources, ["a.txt", "a.txt", "b.txt", "b.txt"]);
        assert_eq!(chunks[2].position, 0);
        assert_eq!(chunks[3].position, 1);
        assert_eq!(chunks[3].metadata, docs[1].metadata);
    }

    #[test]
    fn test_empty_and_short_documents() {
        let chunks = split(&[Document::new("", "empty.txt")], 10, 2).unwrap();
        assert!(chunks.is_empty());

        let chunks = split(&[Document::new("abc", "short.txt")], 10, 2).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "abc");
        assert_eq!((chunks[0].start_char, chunks[0].end_char), (0, 3));
    }
}
