//! Locality-Sensitive Hashing (LSH) for efficient candidate pair generation.
//!
//! LSH groups similar documents into buckets based on their MinHash signatures,
//! so candidate pairs come from bucket collisions instead of comparing every
//! pair of documents.
//!
//! For a pair with Jaccard similarity `s`, `b` bands of `r` rows make it a
//! candidate with probability `1 - (1 - s^r)^b`. Pairs outside that curve can
//! be missed; pairs inside it still need exact verification.

use crate::minhash::MinHashSignature;
use crate::DedupConfig;
use sift_core::hashing::hash_with_seed;
use std::collections::{HashMap, HashSet};

/// Document ID type: the document's position in the input set.
pub type DocId = usize;

/// LSH index for finding candidate duplicate pairs.
///
/// The index divides each MinHash signature into bands of rows.
/// Documents that share at least one band hash are considered candidates.
pub struct LshIndex {
    /// Number of bands (groups of rows).
    num_bands: usize,
    /// Rows per band.
    rows_per_band: usize,
    /// Buckets for each band: band_id -> hash -> doc_ids.
    buckets: Vec<HashMap<u64, Vec<DocId>>>,
    /// Number of inserted documents.
    num_documents: usize,
}

impl LshIndex {
    /// Create a new LSH index with the specified band configuration.
    ///
    /// # Arguments
    /// * `num_bands` - Number of bands to divide the signature into
    /// * `rows_per_band` - Number of rows (hash values) per band
    #[must_use]
    pub fn new(num_bands: usize, rows_per_band: usize) -> Self {
        Self {
            num_bands,
            rows_per_band,
            buckets: (0..num_bands).map(|_| HashMap::new()).collect(),
            num_documents: 0,
        }
    }

    /// Create an index for a validated [`DedupConfig`].
    #[must_use]
    pub fn for_config(config: &DedupConfig) -> Self {
        Self::new(config.num_bands, config.rows_per_band())
    }

    /// Get the number of bands.
    #[must_use]
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Get the number of rows per band.
    #[must_use]
    pub fn rows_per_band(&self) -> usize {
        self.rows_per_band
    }

    /// Add a document signature to the index.
    ///
    /// The signature is divided into bands, and each band is hashed
    /// to place the document into buckets.
    pub fn insert(&mut self, doc_id: DocId, signature: &MinHashSignature) {
        assert!(
            signature.len() >= self.num_bands * self.rows_per_band,
            "Signature too short for LSH configuration"
        );

        for (band, chunk) in signature
            .values
            .chunks_exact(self.rows_per_band)
            .take(self.num_bands)
            .enumerate()
        {
            let band_hash = hash_band(chunk);
            self.buckets[band].entry(band_hash).or_default().push(doc_id);
        }

        self.num_documents += 1;
    }

    /// Get all candidate pairs from the index.
    ///
    /// Returns an iterator over unique (doc_id1, doc_id2) pairs where
    /// doc_id1 < doc_id2 and the documents share at least one bucket.
    pub fn candidates(&self) -> impl Iterator<Item = (DocId, DocId)> + '_ {
        let mut seen = HashSet::new();

        self.buckets
            .iter()
            .flat_map(|band_buckets| {
                band_buckets
                    .values()
                    .filter(|bucket| bucket.len() > 1)
                    .flat_map(|bucket| {
                        bucket.iter().enumerate().flat_map(move |(i, &id1)| {
                            bucket[i + 1..].iter().map(move |&id2| {
                                if id1 < id2 {
                                    (id1, id2)
                                } else {
                                    (id2, id1)
                                }
                            })
                        })
                    })
            })
            .filter(move |pair| seen.insert(*pair))
    }

    /// Get candidate pairs as a sorted vector.
    #[must_use]
    pub fn candidates_vec(&self) -> Vec<(DocId, DocId)> {
        let mut pairs: Vec<_> = self.candidates().collect();
        pairs.sort_unstable();
        pairs
    }

    /// Get the number of buckets with multiple documents.
    #[must_use]
    pub fn num_collision_buckets(&self) -> usize {
        self.buckets
            .iter()
            .flat_map(|band| band.values())
            .filter(|bucket| bucket.len() > 1)
            .count()
    }

    /// Get the total number of documents in the index.
    #[must_use]
    pub fn num_documents(&self) -> usize {
        self.num_documents
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        for band in &mut self.buckets {
            band.clear();
        }
        self.num_documents = 0;
    }
}

/// Hash a band of signature values to a single u64 bucket key.
fn hash_band(values: &[u64]) -> u64 {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    hash_with_seed(&bytes, 0)
}

/// Minimum probability that a pair sitting exactly at the threshold becomes a
/// candidate under the band layout picked by [`optimal_bands`].
pub const MIN_CANDIDATE_RECALL: f64 = 0.9;

/// Pick a band count for the given signature length and target threshold.
///
/// Walks the divisors `b` of `num_permutations` from fewest bands upward and
/// returns the first whose candidate probability at `threshold` reaches
/// [`MIN_CANDIDATE_RECALL`]. Fewer, wider bands admit fewer dissimilar pairs,
/// so this is the most selective layout that still finds pairs at the
/// threshold. Falls back to one row per band when no layout qualifies.
///
/// At 128 permutations and a 0.8 threshold this is 16 bands of 8 rows.
#[must_use]
pub fn optimal_bands(num_permutations: usize, threshold: f64) -> usize {
    (1..=num_permutations)
        .filter(|b| num_permutations % b == 0)
        .find(|&b| {
            candidate_probability(threshold, b, num_permutations / b) >= MIN_CANDIDATE_RECALL
        })
        .unwrap_or(num_permutations)
}

/// Probability that a pair with Jaccard similarity `similarity` becomes a
/// candidate under `num_bands` bands of `rows_per_band` rows.
#[must_use]
pub fn candidate_probability(similarity: f64, num_bands: usize, rows_per_band: usize) -> f64 {
    let band_match = similarity.powi(rows_per_band as i32);
    1.0 - (1.0 - band_match).powi(num_bands as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minhash::MinHasher;

    fn hasher() -> MinHasher {
        MinHasher::new(128).with_ngram_size(2)
    }

    #[test]
    fn test_lsh_basic_insertion() {
        let mut index = LshIndex::new(4, 32);

        let sig = hasher().signature_from_text("Test document for LSH");
        index.insert(1, &sig);

        assert_eq!(index.num_documents(), 1);
    }

    #[test]
    fn test_lsh_identical_documents() {
        let mut index = LshIndex::new(4, 32);

        let sig = hasher().signature_from_text("The quick brown fox jumps over the lazy dog");

        index.insert(1, &sig);
        index.insert(2, &sig);

        let candidates: Vec<_> = index.candidates().collect();

        assert_eq!(candidates, vec![(1, 2)]);
    }

    #[test]
    fn test_lsh_different_documents() {
        let mut index = LshIndex::new(4, 32);
        let hasher = hasher();

        let sig1 = hasher.signature_from_text("The quick brown fox");
        let sig2 = hasher.signature_from_text("Completely different text about machine learning");

        index.insert(1, &sig1);
        index.insert(2, &sig2);

        // 32-row bands of disjoint shingle sets essentially never collide.
        assert_eq!(index.candidates().count(), 0);
    }

    #[test]
    fn test_lsh_for_config() {
        let config = DedupConfig {
            num_permutations: 120,
            num_bands: 20,
            ..DedupConfig::default()
        };
        let index = LshIndex::for_config(&config);

        assert_eq!(index.num_bands(), 20);
        assert_eq!(index.rows_per_band(), 6);
    }

    #[test]
    fn test_lsh_candidate_deduplication() {
        let mut index = LshIndex::new(4, 32);

        // Same text will hash to same buckets in all bands
        let sig = hasher().signature_from_text("Same document text");

        index.insert(1, &sig);
        index.insert(2, &sig);
        index.insert(3, &sig);

        // One pair per unordered combination despite colliding in every band.
        assert_eq!(index.candidates_vec(), vec![(1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_lsh_many_documents() {
        let mut index = LshIndex::new(16, 8);
        let hasher = hasher();

        for i in 0..100 {
            let text = format!(
                "Document number {i} with unique content about topic {}",
                i % 10
            );
            let sig = hasher.signature_from_text(&text);
            index.insert(i, &sig);
        }

        assert_eq!(index.num_documents(), 100);

        let candidates = index.candidates_vec();
        let max_pairs = 100 * 99 / 2;
        assert!(
            candidates.len() < max_pairs / 2,
            "LSH should reduce candidate pairs significantly"
        );
    }

    #[test]
    fn test_lsh_clear() {
        let mut index = LshIndex::new(4, 32);

        let sig = hasher().signature_from_text("Test document");
        index.insert(1, &sig);
        index.insert(2, &sig);

        assert_eq!(index.num_documents(), 2);
        assert!(index.num_collision_buckets() > 0);

        index.clear();

        assert_eq!(index.num_documents(), 0);
        assert_eq!(index.candidates().count(), 0);
    }

    #[test]
    fn test_optimal_bands() {
        for threshold in [0.5, 0.7, 0.85, 0.9, 0.95] {
            let b = optimal_bands(128, threshold);
            assert!(b > 0);
            assert_eq!(128 % b, 0, "bands must divide num_permutations");
        }

        // Stricter thresholds want fewer, wider bands.
        assert!(optimal_bands(128, 0.95) <= optimal_bands(128, 0.5));
    }

    #[test]
    fn test_optimal_bands_default_threshold() {
        // 8 x 16 only catches about a fifth of the pairs at 0.8.
        assert!(candidate_probability(0.8, 8, 16) < 0.25);
        assert_eq!(optimal_bands(128, 0.8), 16);
        assert_eq!(optimal_bands(128, 0.9), 16);
        assert_eq!(optimal_bands(128, 0.5), 64);
    }

    #[test]
    fn test_optimal_bands_reach_recall_at_threshold() {
        for threshold in [0.5, 0.6, 0.7, 0.8, 0.85, 0.9, 0.95, 1.0] {
            let b = optimal_bands(128, threshold);
            let recall = candidate_probability(threshold, b, 128 / b);
            assert!(
                recall >= MIN_CANDIDATE_RECALL,
                "threshold {threshold}: {b} bands give recall {recall}"
            );
        }
    }

    #[test]
    fn test_optimal_bands_falls_back_to_single_rows() {
        assert_eq!(optimal_bands(128, 0.0), 128);
        assert_eq!(optimal_bands(128, 1.0), 1);
    }

    #[test]
    fn test_candidate_probability_s_curve() {
        let low = candidate_probability(0.3, 16, 8);
        let high = candidate_probability(0.9, 16, 8);

        assert!(low < 0.01, "low similarity pairs rarely collide: {low}");
        assert!(high > 0.99, "high similarity pairs almost always collide: {high}");
        assert!((candidate_probability(1.0, 16, 8) - 1.0).abs() < f64::EPSILON);
        assert!(candidate_probability(0.0, 16, 8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lsh_pair_ordering() {
        let mut index = LshIndex::new(4, 32);

        let sig = hasher().signature_from_text("Test document for pair ordering");

        // Insert in reverse order
        index.insert(10, &sig);
        index.insert(5, &sig);

        let candidates: Vec<_> = index.candidates().collect();

        assert_eq!(candidates, vec![(5, 10)]);
    }
}
