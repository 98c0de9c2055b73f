//! Source text normalization
//!
//! Text extracted from PDFs and scans often carries spaces between a Thai
//! consonant and its vowel or tone mark ("พ ิ"), which breaks both
//! embedding quality and keyword matching. [`TextNormalizer`] repairs
//! that with an ordered list of rewrites:
//!
//! 1. drop a single space between a Thai character and a following Thai character
//! 2. drop a space before a tone mark
//! 3. drop a space after a leading vowel
//! 4. collapse whitespace runs to one space
//! 5. trim
//!
//! Rule 3 must run before rule 4, otherwise collapsed runs after a leading
//! vowel would survive as single spaces.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::thai::is_thai;

static SPACE_BEFORE_TONE_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s([\x{0E48}-\x{0E4B}])").unwrap());

static SPACE_AFTER_LEADING_VOWEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([เแโใไ])\s").unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Pure text normalizer, applied to every document before chunking
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize raw source text. Never fails; empty input yields empty output.
    pub fn normalize(&self, raw: &str) -> String {
        let joined = join_split_syllables(raw);
        let text = SPACE_BEFORE_TONE_MARK.replace_all(&joined, "$1");
        let text = SPACE_AFTER_LEADING_VOWEL.replace_all(&text, "$1");
        let text = WHITESPACE_RUN.replace_all(&text, " ");
        text.trim().to_string()
    }
}

/// Remove one whitespace character sitting between two Thai characters.
///
/// Neighbours are judged on the input, so "ก ก ก" becomes "กกก". The regex
/// crate has no lookahead, hence the manual scan.
fn join_split_syllables(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            if is_thai(prev) && next.is_some_and(is_thai) {
                continue;
            }
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(s: &str) -> String {
        TextNormalizer::new().normalize(s)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn test_consonant_vowel_join() {
        assert_eq!(normalize("พ ิพิธภัณฑ์"), "พิพิธภัณฑ์");
    }

    #[test]
    fn test_tone_mark_join() {
        assert_eq!(normalize("ที ่"), "ที่");
        // space before tone mark after a non-Thai char is still removed
        assert_eq!(normalize("a ่"), "a่");
    }

    #[test]
    fn test_leading_vowel_join() {
        assert_eq!(normalize("เ พลง"), "เพลง");
        assert_eq!(normalize("abc ไ\tx"), "abc ไx");
    }

    #[test]
    fn test_double_space_between_thai_words_kept() {
        // only a single whitespace char is removed between Thai characters
        assert_eq!(normalize("ไทย  ลาว"), "ไทย ลาว");
    }

    #[test]
    fn test_consecutive_single_spaces() {
        assert_eq!(normalize("ก ก ก"), "กกก");
    }

    #[test]
    fn test_latin_text_collapsed_and_trimmed() {
        assert_eq!(normalize("  Hello \n\n  world  "), "Hello world");
    }

    #[test]
    fn test_mixed_script_boundary_kept() {
        assert_eq!(normalize("Museum พิพิธภัณฑ์"), "Museum พิพิธภัณฑ์");
        assert_eq!(normalize("พิพิธภัณฑ์ Museum"), "พิพิธภัณฑ์ Museum");
    }
}
