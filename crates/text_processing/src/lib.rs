//! Text Processing for Voice Agent
//!
//! This crate provides the text clean-up used before indexing and before
//! handing text back to the reasoning service:
//! - **Normalization**: Repair spacing injected into Thai text by PDF/OCR extraction
//! - **Truncation**: Cap answers without splitting grapheme clusters
//!
//! # Example
//!
//! ```
//! use voice_agent_text_processing::TextNormalizer;
//!
//! let normalizer = TextNormalizer::new();
//! assert_eq!(normalizer.normalize("  เ พลง   ไทย "), "เพลง ไทย");
//! ```

pub mod normalizer;
pub mod thai;
pub mod truncate;

pub use normalizer::TextNormalizer;
pub use truncate::{truncate_graphemes, Truncated};
