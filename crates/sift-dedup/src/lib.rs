//! # sift-dedup
//!
//! Deduplication stages for building a pretraining corpus out of cleaned
//! web text:
//!
//! - [`line_dedup`]: drop every line that occurs more than once across the
//!   whole corpus
//! - near-duplicate document removal: [`normalize`] → [`shingle`] →
//!   [`minhash`] → [`lsh`] → [`verify`] → [`cluster`], driven by
//!   [`Deduplicator`]
//! - [`quality`] and [`pii`]: the per-document cleaning heuristics that run
//!   before deduplication
//!
//! ```
//! use sift_dedup::{DedupConfig, Deduplicator};
//!
//! let dedup = Deduplicator::new(DedupConfig::default().with_ngram_size(3)).unwrap();
//! let result = dedup.deduplicate_texts(&[
//!     "the quick brown fox jumps over the lazy dog",
//!     "The quick brown fox jumps over the lazy dog!",
//!     "an entirely different document about rust",
//! ]);
//! assert_eq!(result.keep_indices, vec![0, 2]);
//! ```

pub mod cluster;
pub mod io;
pub mod line_dedup;
pub mod lsh;
pub mod minhash;
pub mod normalize;
pub mod pii;
pub mod pipeline;
pub mod quality;
pub mod shingle;
pub mod verify;

pub use cluster::{resolve_clusters, ClusterResolution, UnionFind};
pub use io::{collect_input_files, load_documents, LoadedCorpus, SourceDocument};
pub use line_dedup::{exact_line_dedup, LineDedupStats};
pub use lsh::{optimal_bands, DocId, LshIndex};
pub use minhash::{MinHashSignature, MinHasher};
pub use normalize::normalize_text;
pub use pipeline::{minhash_dedup_files, run_pipeline, MinhashDedupReport, PipelineReport};
pub use shingle::{word_ngrams, ShingleSet};
pub use sift_core::{Result, SiftError};
pub use verify::jaccard;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Configuration for MinHash/LSH near-duplicate removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Number of MinHash permutations (signature length).
    pub num_permutations: usize,
    /// Number of LSH bands; must divide `num_permutations`.
    pub num_bands: usize,
    /// Word n-gram size for shingling.
    pub ngram_size: usize,
    /// Exact Jaccard threshold (inclusive) for a confirmed duplicate.
    pub threshold: f64,
    /// Seed for the permutation family.
    pub seed: u64,
    /// Exclude documents whose normalized text is empty.
    #[serde(default)]
    pub drop_empty: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            num_permutations: minhash::DEFAULT_NUM_PERMUTATIONS,
            num_bands: 16,
            ngram_size: shingle::DEFAULT_NGRAM_SIZE,
            threshold: 0.8,
            seed: minhash::DEFAULT_SEED,
            drop_empty: false,
        }
    }
}

impl DedupConfig {
    /// Check the configuration before any document is processed.
    pub fn validate(&self) -> Result<()> {
        if self.num_permutations == 0 {
            return Err(SiftError::Config("num_permutations must be > 0".into()));
        }
        if self.num_bands == 0 {
            return Err(SiftError::Config("num_bands must be > 0".into()));
        }
        if self.num_permutations % self.num_bands != 0 {
            return Err(SiftError::Config(format!(
                "num_permutations ({}) must be divisible by num_bands ({})",
                self.num_permutations, self.num_bands
            )));
        }
        if self.ngram_size == 0 {
            return Err(SiftError::Config("ngram size must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SiftError::Config(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Rows per LSH band.
    #[must_use]
    pub fn rows_per_band(&self) -> usize {
        if self.num_bands == 0 {
            0
        } else {
            self.num_permutations / self.num_bands
        }
    }

    /// Set the similarity threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the number of permutations.
    #[must_use]
    pub fn with_permutations(mut self, n: usize) -> Self {
        self.num_permutations = n;
        self
    }

    /// Set the number of LSH bands.
    #[must_use]
    pub fn with_bands(mut self, n: usize) -> Self {
        self.num_bands = n;
        self
    }

    /// Pick the band count from the threshold (see [`optimal_bands`]).
    #[must_use]
    pub fn with_auto_bands(mut self) -> Self {
        if self.num_permutations > 0 {
            self.num_bands = optimal_bands(self.num_permutations, self.threshold);
        }
        self
    }

    /// Set the n-gram size.
    #[must_use]
    pub fn with_ngram_size(mut self, n: usize) -> Self {
        self.ngram_size = n;
        self
    }

    /// Set the permutation seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Exclude documents whose normalized text is empty.
    #[must_use]
    pub fn with_drop_empty(mut self, drop_empty: bool) -> Self {
        self.drop_empty = drop_empty;
        self
    }
}

/// Statistics from a deduplication run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupStats {
    /// Documents considered.
    pub total_documents: usize,
    /// Documents kept.
    pub unique_documents: usize,
    /// Documents removed as near-duplicates.
    pub duplicate_count: usize,
    /// `duplicate_count / total_documents`.
    pub duplicate_ratio: f64,
    /// Clusters with more than one member.
    pub cluster_count: usize,
    /// Pairs produced by the LSH index.
    pub candidate_pairs: usize,
    /// Candidate pairs confirmed by exact Jaccard.
    pub verified_pairs: usize,
    /// Documents with no shingles (too short to compare).
    pub empty_documents: usize,
    /// Documents dropped because their normalized text was empty.
    pub dropped_empty: usize,
}

/// Result of deduplicating a batch of documents.
#[derive(Debug, Clone, Default)]
pub struct DedupResult {
    /// Indices of kept documents, ascending.
    pub keep_indices: Vec<usize>,
    /// Indices of removed documents, ascending.
    pub remove_indices: Vec<usize>,
    /// Duplicate clusters keyed by survivor index; members ascending.
    pub clusters: HashMap<usize, Vec<usize>>,
    /// Run statistics.
    pub stats: DedupStats,
}

/// Per-document features computed before indexing.
struct Features {
    blank: bool,
    shingles: ShingleSet,
    signature: MinHashSignature,
}

/// MinHash/LSH near-duplicate remover.
///
/// Documents are identified by their index in the input slice; within each
/// cluster of near-duplicates the smallest index survives.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    config: DedupConfig,
    hasher: MinHasher,
}

impl Deduplicator {
    /// Create a deduplicator, rejecting invalid configurations.
    pub fn new(config: DedupConfig) -> Result<Self> {
        config.validate()?;
        let hasher = MinHasher::with_seed(config.num_permutations, config.seed)
            .with_ngram_size(config.ngram_size);
        Ok(Self { config, hasher })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Deduplicate raw texts.
    #[must_use]
    pub fn deduplicate_texts(&self, texts: &[&str]) -> DedupResult {
        self.run(texts)
    }

    /// Deduplicate loaded documents; indices refer to positions in `docs`.
    #[must_use]
    pub fn deduplicate_documents(&self, docs: &[SourceDocument]) -> DedupResult {
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        self.run(&texts)
    }

    fn run(&self, texts: &[&str]) -> DedupResult {
        let total = texts.len();
        if total == 0 {
            return DedupResult::default();
        }

        // Signatures are independent per document; everything after this
        // point needs all of them.
        let features: Vec<Features> = texts
            .par_iter()
            .map(|text| {
                let normalized = normalize_text(text);
                let shingles = word_ngrams(&normalized, self.config.ngram_size);
                let signature = self.hasher.signature(&shingles);
                Features {
                    blank: normalized.is_empty(),
                    shingles,
                    signature,
                }
            })
            .collect();

        let mut index = LshIndex::for_config(&self.config);
        let mut empty_documents = 0;
        for (id, feature) in features.iter().enumerate() {
            if feature.shingles.is_empty() {
                empty_documents += 1;
                continue;
            }
            index.insert(id, &feature.signature);
        }

        let candidates = index.candidates_vec();
        debug!(
            candidates = candidates.len(),
            collision_buckets = index.num_collision_buckets(),
            "LSH candidate generation done"
        );

        let blank: Vec<bool> = features.iter().map(|f| f.blank).collect();
        let shingles: Vec<ShingleSet> = features.into_iter().map(|f| f.shingles).collect();
        let duplicates = verify::verify_candidates(&candidates, &shingles, self.config.threshold);

        let resolution = resolve_clusters(total, &duplicates);

        let mut keep = vec![false; total];
        for &id in &resolution.survivors {
            keep[id] = true;
        }
        let mut dropped_empty = 0;
        if self.config.drop_empty {
            for (id, is_blank) in blank.iter().enumerate() {
                if *is_blank && keep[id] {
                    keep[id] = false;
                    dropped_empty += 1;
                }
            }
        }

        let (keep_indices, remove_indices): (Vec<usize>, Vec<usize>) =
            (0..total).partition(|&id| keep[id]);

        let duplicate_count = resolution.removed_count();
        let stats = DedupStats {
            total_documents: total,
            unique_documents: keep_indices.len(),
            duplicate_count,
            duplicate_ratio: duplicate_count as f64 / total as f64,
            cluster_count: resolution.clusters.len(),
            candidate_pairs: candidates.len(),
            verified_pairs: duplicates.len(),
            empty_documents,
            dropped_empty,
        };

        info!(
            total = stats.total_documents,
            kept = stats.unique_documents,
            duplicates = stats.duplicate_count,
            clusters = stats.cluster_count,
            "near-duplicate removal finished"
        );

        DedupResult {
            keep_indices,
            remove_indices,
            clusters: resolution.clusters,
            stats,
        }
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        let config = DedupConfig::default();
        let hasher = MinHasher::with_seed(config.num_permutations, config.seed)
            .with_ngram_size(config.ngram_size);
        Self { config, hasher }
    }
}
