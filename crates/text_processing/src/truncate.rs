//! Grapheme-safe truncation
//!
//! Thai vowels and tone marks are combining characters. A raw character
//! slice can separate them from their base consonant, so the cut is made
//! on extended grapheme cluster boundaries instead.

use unicode_segmentation::UnicodeSegmentation;

/// Result of [`truncate_graphemes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub text: String,
    /// Whether anything was cut
    pub truncated: bool,
}

/// Keep whole grapheme clusters while the character count stays within `max_chars`.
///
/// The result never exceeds `max_chars` characters. It may be shorter when
/// the cluster straddling the limit is dropped.
pub fn truncate_graphemes(text: &str, max_chars: usize) -> Truncated {
    if text.chars().count() <= max_chars {
        return Truncated {
            text: text.to_string(),
            truncated: false,
        };
    }

    let mut used = 0;
    let mut end = 0;
    for (offset, grapheme) in text.grapheme_indices(true) {
        let len = grapheme.chars().count();
        if used + len > max_chars {
            break;
        }
        used += len;
        end = offset + grapheme.len();
    }

    Truncated {
        text: text[..end].to_string(),
        truncated: true,
    }
}
