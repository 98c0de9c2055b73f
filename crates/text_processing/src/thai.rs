//! Thai Script Utilities
//!
//! Character classes used by the normalizer. Ranges follow the Thai block
//! U+0E00..U+0E7F.

/// First character of the Thai range used for letters, vowels and marks (ก)
pub const THAI_FIRST: char = '\u{0E01}';

/// Last character of that range (๙, Thai digit nine)
pub const THAI_LAST: char = '\u{0E59}';

/// Leading vowels written before the consonant they follow phonetically
pub const LEADING_VOWELS: [char; 5] = ['เ', 'แ', 'โ', 'ใ', 'ไ'];

/// Check if a character is in the Thai letter/mark/digit range (ก-๙)
pub fn is_thai(c: char) -> bool {
    (THAI_FIRST..=THAI_LAST).contains(&c)
}

/// Check if a character is a combining tone mark (่ ้ ๊ ๋)
pub fn is_tone_mark(c: char) -> bool {
    ('\u{0E48}'..='\u{0E4B}').contains(&c)
}

/// Check if a character is a leading vowel (เ แ โ ใ ไ)
pub fn is_leading_vowel(c: char) -> bool {
    LEADING_VOWELS.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thai_range() {
        assert!(is_thai('ก'));
        assert!(is_thai('ิ'));
        assert!(is_thai('๙'));
        assert!(!is_thai('a'));
        assert!(!is_thai(' '));
    }

    #[test]
    fn test_tone_marks() {
        for c in ['่', '้', '๊', '๋'] {
            assert!(is_tone_mark(c), "{c:?} should be a tone mark");
            assert!(is_thai(c));
        }
        assert!(!is_tone_mark('า'));
    }

    #[test]
    fn test_leading_vowels() {
        assert!(is_leading_vowel('เ'));
        assert!(is_leading_vowel('ไ'));
        assert!(!is_leading_vowel('า'));
    }
}
