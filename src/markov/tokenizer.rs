use unicode_segmentation::UnicodeSegmentation;

use super::{BEGIN, END};

/// Splits a post into the tokens a chain is built from.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Tokenizer over Unicode word boundaries.
///
/// Whitespace and punctuation become tokens of their own, so concatenating
/// the output reproduces the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .trim()
            .chars()
            .filter(|c| !BEGIN.contains(*c) && !END.contains(*c))
            .collect();
        cleaned
            .split_word_bounds()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_text() {
        let text = "Hello, world! Ünïcode too.";
        assert_eq!(WordTokenizer.tokenize(text).concat(), text);
    }

    #[test]
    fn test_japanese_text_is_preserved() {
        let text = "アルミ缶の上にあるミカン";
        let tokens = WordTokenizer.tokenize(text);
        assert!(!tokens.is_empty());
        assert_eq!(tokens.concat(), text);
    }

    #[test]
    fn test_markers_and_padding_removed() {
        assert_eq!(WordTokenizer.tokenize("  a\u{2}b\u{3}  ").concat(), "ab");
        assert!(WordTokenizer.tokenize("   ").is_empty());
    }
}
