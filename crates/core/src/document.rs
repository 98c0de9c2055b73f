//! Document and chunk types
//!
//! A [`Document`] is one normalized source text. A [`Chunk`] is a contiguous
//! character window of a document and carries a copy of its metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key holding the document origin (file path)
pub const SOURCE_KEY: &str = "source";

/// Source document, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Normalized content
    pub content: String,
    /// Metadata (always contains `source`)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with its `source` metadata set
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Source identifier
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Contiguous slice of a document's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub content: String,
    /// Copy of the parent document's metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Position of the chunk within its document
    pub position: usize,
    /// Start offset in the parent document (characters, inclusive)
    pub start_char: usize,
    /// End offset in the parent document (characters, exclusive)
    pub end_char: usize,
}

impl Chunk {
    /// Source identifier inherited from the parent document
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_source() {
        let doc = Document::new("hello", "database/a.txt").with_metadata("lang", "th");
        assert_eq!(doc.source(), Some("database/a.txt"));
        assert_eq!(doc.metadata.get("lang").map(String::as_str), Some("th"));
    }

    #[test]
    fn test_char_len_counts_characters() {
        let doc = Document::new("สวัสดี", "a.txt");
        assert_eq!(doc.char_len(), 6);
        assert!(doc.content.len() > 6);
    }
}
