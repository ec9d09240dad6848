//! Word n-gram shingling.

use std::collections::HashSet;

/// Default n-gram size for shingling.
pub const DEFAULT_NGRAM_SIZE: usize = 5;

/// A document's set of word n-grams.
pub type ShingleSet = HashSet<String>;

/// Extract the set of word n-grams of length `n` from normalized text.
///
/// Words are whitespace-separated; each shingle is `n` consecutive words
/// joined by a single space. Text with fewer than `n` words (or `n == 0`)
/// yields an empty set.
#[must_use]
pub fn word_ngrams(text: &str, n: usize) -> ShingleSet {
    let words: Vec<&str> = text.split_whitespace().collect();

    if n == 0 || words.len() < n {
        return HashSet::new();
    }

    words.windows(n).map(|window| window.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigrams() {
        let shingles = word_ngrams("one two three four five", 3);

        assert_eq!(shingles.len(), 3);
        assert!(shingles.contains("one two three"));
        assert!(shingles.contains("two three four"));
        assert!(shingles.contains("three four five"));
    }

    #[test]
    fn test_exactly_n_words_gives_one_shingle() {
        for n in 1..=8 {
            let text: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
            assert_eq!(word_ngrams(&text.join(" "), n).len(), 1, "n = {n}");
        }
    }

    #[test]
    fn test_fewer_than_n_words_gives_none() {
        for n in 1..=8 {
            let text: Vec<String> = (0..n - 1).map(|i| format!("w{i}")).collect();
            assert!(word_ngrams(&text.join(" "), n).is_empty(), "n = {n}");
        }
    }

    #[test]
    fn test_repeated_ngrams_collapse() {
        let shingles = word_ngrams("a b a b a b", 2);
        assert_eq!(shingles.len(), 2);
        assert!(shingles.contains("a b"));
        assert!(shingles.contains("b a"));
    }

    #[test]
    fn test_irregular_whitespace() {
        let shingles = word_ngrams("  one\ttwo \n three ", 2);
        assert_eq!(shingles.len(), 2);
        assert!(shingles.contains("one two"));
    }

    #[test]
    fn test_zero_n_is_empty() {
        assert!(word_ngrams("one two", 0).is_empty());
        assert!(word_ngrams("", 1).is_empty());
    }
}
