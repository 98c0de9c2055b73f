//! Verse segmentation
//!
//! Splits a reply into short speakable units. A verse closes when it holds
//! `max_len` words or when the word just added ends with a sentence
//! terminal. Leftover words form a final verse.

use voice_agent_config::constants::speech;

/// One speakable segment
pub type Verse = String;

/// Full stop, exclamation, question, Devanagari danda, Thai fongman
pub const DEFAULT_TERMINALS: [char; 5] = ['.', '!', '?', '।', '๏'];

/// Word-count and punctuation based segmenter
#[derive(Debug, Clone)]
pub struct VerseSegmenter {
    max_len: usize,
    terminals: Vec<char>,
}

impl Default for VerseSegmenter {
    fn default() -> Self {
        Self::new(speech::MAX_VERSE_WORDS)
    }
}

impl VerseSegmenter {
    /// Segmenter with the default terminal set. `max_len` below 1 is raised to 1.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
            terminals: DEFAULT_TERMINALS.to_vec(),
        }
    }

    /// Replace the terminal punctuation set
    pub fn with_terminals(mut self, terminals: impl IntoIterator<Item = char>) -> Self {
        self.terminals = terminals.into_iter().collect();
        self
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn is_terminal(&self, word: &str) -> bool {
        word.chars()
            .next_back()
            .is_some_and(|c| self.terminals.contains(&c))
    }

    /// Split `text` into verses. Whitespace-only input yields none.
    pub fn segment(&self, text: &str) -> Vec<Verse> {
        let mut verses = Vec::new();
        let mut current: Vec<&str> = Vec::with_capacity(self.max_len);

        for word in text.split_whitespace() {
            current.push(word);
            if current.len() >= self.max_len || self.is_terminal(word) {
                verses.push(current.join(" "));
                current.clear();
            }
        }

        if !current.is_empty() {
            verses.push(current.join(" "));
        }

        verses
    }
}

/// Segment with the default terminal set
pub fn split_into_verses(text: &str, max_len: usize) -> Vec<Verse> {
    VerseSegmenter::new(max_len).segment(text)
}
