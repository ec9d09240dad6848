//! Exact Jaccard verification of LSH candidates.

use crate::lsh::DocId;
use crate::shingle::ShingleSet;

/// Exact Jaccard similarity `|a ∩ b| / |a ∪ b|`.
///
/// Two empty sets have similarity 0.0.
#[must_use]
pub fn jaccard(a: &ShingleSet, b: &ShingleSet) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let intersection = small.iter().filter(|s| large.contains(*s)).count();
    let union = a.len() + b.len() - intersection;

    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}

/// Whether two shingle sets are duplicates at the given threshold (inclusive).
///
/// Two empty sets are never duplicates, even at a threshold of 0.0.
#[must_use]
pub fn is_duplicate(a: &ShingleSet, b: &ShingleSet, threshold: f64) -> bool {
    if a.is_empty() && b.is_empty() {
        return false;
    }
    jaccard(a, b) >= threshold
}

/// Keep the candidate pairs whose exact Jaccard similarity meets `threshold`.
///
/// `shingles` is indexed by [`DocId`].
#[must_use]
pub fn verify_candidates(
    candidates: &[(DocId, DocId)],
    shingles: &[ShingleSet],
    threshold: f64,
) -> Vec<(DocId, DocId)> {
    candidates
        .iter()
        .copied()
        .filter(|&(a, b)| is_duplicate(&shingles[a], &shingles[b], threshold))
        .collect()
}
