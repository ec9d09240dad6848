//! MinHash signature generation for document similarity.
//!
//! MinHash is a locality-sensitive hashing technique that approximates
//! the Jaccard similarity between sets.

use crate::normalize::normalize_text;
use crate::shingle::{word_ngrams, ShingleSet, DEFAULT_NGRAM_SIZE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sift_core::hashing::hash_with_seed;

/// Default number of permutations for MinHash signatures.
pub const DEFAULT_NUM_PERMUTATIONS: usize = 128;

/// Default seed for the permutation family.
pub const DEFAULT_SEED: u64 = 42;

/// MinHash signature - a compact representation of a document's shingle set.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MinHashSignature {
    /// The minimum hash values for each permutation.
    pub values: Vec<u64>,
}

impl MinHashSignature {
    /// Create a new signature with the given values.
    #[must_use]
    pub fn new(values: Vec<u64>) -> Self {
        Self { values }
    }

    /// Get the number of permutations in this signature.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the signature is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether this is the signature of an empty shingle set.
    #[must_use]
    pub fn is_empty_set(&self) -> bool {
        self.values.iter().all(|&v| v == u64::MAX)
    }
}

/// MinHash signature generator.
///
/// Uses multiple hash functions (simulated via seeds) to generate
/// compact signatures that preserve Jaccard similarity.
#[derive(Clone, Debug)]
pub struct MinHasher {
    /// Number of hash permutations.
    num_permutations: usize,
    /// Seeds for each hash permutation.
    seeds: Vec<u64>,
    /// N-gram size for shingling.
    ngram_size: usize,
}

impl MinHasher {
    /// Create a new MinHasher with the specified number of permutations.
    ///
    /// Uses a fixed seed for reproducibility.
    #[must_use]
    pub fn new(num_permutations: usize) -> Self {
        Self::with_seed(num_permutations, DEFAULT_SEED)
    }

    /// Create a new MinHasher with a specific random seed.
    #[must_use]
    pub fn with_seed(num_permutations: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds: Vec<u64> = (0..num_permutations).map(|_| rng.gen()).collect();

        Self {
            num_permutations,
            seeds,
            ngram_size: DEFAULT_NGRAM_SIZE,
        }
    }

    /// Set the n-gram size for shingling.
    #[must_use]
    pub fn with_ngram_size(mut self, ngram_size: usize) -> Self {
        self.ngram_size = ngram_size;
        self
    }

    /// Get the number of permutations.
    #[must_use]
    pub fn num_permutations(&self) -> usize {
        self.num_permutations
    }

    /// Get the n-gram size.
    #[must_use]
    pub fn ngram_size(&self) -> usize {
        self.ngram_size
    }

    /// Generate a MinHash signature from a shingle set.
    ///
    /// Each shingle is hashed once, the base hash is rehashed under every
    /// permutation seed, and the minimum value is kept per permutation.
    /// An empty set yields a signature of all `u64::MAX`.
    #[must_use]
    pub fn signature(&self, shingles: &ShingleSet) -> MinHashSignature {
        let mut min_hashes = vec![u64::MAX; self.num_permutations];

        for shingle in shingles {
            let base = hash_with_seed(shingle.as_bytes(), 0).to_le_bytes();
            for (slot, &seed) in min_hashes.iter_mut().zip(&self.seeds) {
                let hash = hash_with_seed(&base, seed);
                if hash < *slot {
                    *slot = hash;
                }
            }
        }

        MinHashSignature::new(min_hashes)
    }

    /// Generate a MinHash signature directly from raw text.
    ///
    /// Normalizes the text, shingles it into word n-grams and computes
    /// the signature.
    #[must_use]
    pub fn signature_from_text(&self, text: &str) -> MinHashSignature {
        let shingles = self.shingle(text);
        self.signature(&shingles)
    }

    /// Normalize raw text and shingle it with this hasher's n-gram size.
    #[must_use]
    pub fn shingle(&self, text: &str) -> ShingleSet {
        word_ngrams(&normalize_text(text), self.ngram_size)
    }

    /// Estimate Jaccard similarity from two MinHash signatures.
    ///
    /// The similarity is approximated by the fraction of hash values
    /// that match between the two signatures. Signatures of different
    /// lengths come from different hashers and score 0.0.
    #[must_use]
    pub fn similarity(sig1: &MinHashSignature, sig2: &MinHashSignature) -> f64 {
        if sig1.values.len() != sig2.values.len() || sig1.values.is_empty() {
            return 0.0;
        }

        let matches = sig1
            .values
            .iter()
            .zip(sig2.values.iter())
            .filter(|(a, b)| a == b)
            .count();

        matches as f64 / sig1.values.len() as f64
    }
}

impl Default for MinHasher {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_PERMUTATIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::jaccard;

    #[test]
    fn test_minhash_identical_documents() {
        let hasher = MinHasher::new(128);
        let text = "The quick brown fox jumps over the lazy dog";

        let sig1 = hasher.signature_from_text(text);
        let sig2 = hasher.signature_from_text(text);

        let similarity = MinHasher::similarity(&sig1, &sig2);
        assert!(
            (similarity - 1.0).abs() < f64::EPSILON,
            "Identical documents should have similarity 1.0, got {similarity}"
        );
    }

    #[test]
    fn test_similarity_length_mismatch() {
        let text = "The quick brown fox jumps over the lazy dog";
        let short = MinHasher::new(64).signature_from_text(text);
        let long = MinHasher::new(128).signature_from_text(text);

        assert_eq!(MinHasher::similarity(&short, &long), 0.0);
        assert_eq!(MinHasher::similarity(&long, &short), 0.0);
    }

    #[test]
    fn test_minhash_normalization_applied() {
        let hasher = MinHasher::new(64).with_ngram_size(3);
        let sig1 = hasher.signature_from_text("The Quick, brown FOX jumps!");
        let sig2 = hasher.signature_from_text("the quick brown fox   jumps");
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_minhash_different_documents() {
        let hasher = MinHasher::new(128).with_ngram_size(2);
        let text1 = "The quick brown fox jumps over the lazy dog";
        let text2 = "Completely different text about machine learning algorithms";

        let sig1 = hasher.signature_from_text(text1);
        let sig2 = hasher.signature_from_text(text2);

        let similarity = MinHasher::similarity(&sig1, &sig2);
        assert!(
            similarity < 0.3,
            "Different documents should have low similarity, got {similarity}"
        );
    }

    #[test]
    fn test_minhash_empty_document() {
        let hasher = MinHasher::new(128);
        let sig = hasher.signature_from_text("");

        assert_eq!(sig.len(), 128);
        assert!(sig.is_empty_set());
    }

    #[test]
    fn test_minhash_short_document_is_empty_set() {
        // Fewer words than the n-gram size: no shingles, no error.
        let hasher = MinHasher::new(32).with_ngram_size(5);
        let sig = hasher.signature_from_text("only three words");
        assert!(sig.is_empty_set());
    }

    #[test]
    fn test_minhash_signature_length() {
        for num_perms in [64, 128, 256] {
            let hasher = MinHasher::new(num_perms).with_ngram_size(2);
            let sig = hasher.signature_from_text("Some test document");
            assert_eq!(sig.len(), num_perms);
        }
    }

    #[test]
    fn test_minhash_reproducibility() {
        let hasher1 = MinHasher::with_seed(128, 12345).with_ngram_size(2);
        let hasher2 = MinHasher::with_seed(128, 12345).with_ngram_size(2);
        let text = "Reproducibility test document with a few words";

        let sig1 = hasher1.signature_from_text(text);
        let sig2 = hasher2.signature_from_text(text);

        assert_eq!(sig1, sig2, "Same seed should produce same signature");
    }

    #[test]
    fn test_minhash_seed_changes_signature() {
        let text = "seeded permutations differ between hasher instances";
        let sig1 = MinHasher::with_seed(64, 1).with_ngram_size(2).signature_from_text(text);
        let sig2 = MinHasher::with_seed(64, 2).with_ngram_size(2).signature_from_text(text);
        assert_ne!(sig1, sig2);
    }

    #[test]
    fn test_shingle_uses_ngram_size() {
        let hasher = MinHasher::new(16).with_ngram_size(3);
        let shingles = hasher.shingle("One two, three four five!");
        assert_eq!(shingles.len(), 3);
        assert!(shingles.contains("one two three"));
    }

    #[test]
    fn test_jaccard_approximation() {
        let hasher = MinHasher::new(256).with_ngram_size(1);

        let text1 = "word1 word2 word3 word4 word5 word6 word7 word8 word9 word10";
        let text2 = "word1 word2 word3 word4 word5 wordA wordB wordC wordD wordE";

        let shingles1 = hasher.shingle(text1);
        let shingles2 = hasher.shingle(text2);
        let exact = jaccard(&shingles1, &shingles2);

        let sig1 = hasher.signature(&shingles1);
        let sig2 = hasher.signature(&shingles2);
        let estimate = MinHasher::similarity(&sig1, &sig2);

        let diff = (exact - estimate).abs();
        assert!(
            diff < 0.2,
            "MinHash should approximate Jaccard. Exact: {exact}, MinHash: {estimate}"
        );
    }

    #[test]
    fn test_signature_from_shingle_set() {
        let hasher = MinHasher::new(128);
        let shingles: ShingleSet = ["a b", "b c", "c d"].iter().map(|s| s.to_string()).collect();

        let sig = hasher.signature(&shingles);
        assert_eq!(sig.len(), 128);
        assert!(!sig.is_empty_set());
    }
}
