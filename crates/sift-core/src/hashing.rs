//! Hashing functions.

/// Trait for hash functions.
pub trait HashFunction: Send + Sync {
    /// Hash data and return u64 (for use in hash maps and bucket keys).
    fn hash_u64(&self, data: &[u8]) -> u64;

    /// Hash data and return a 128-bit digest.
    fn hash_u128(&self, data: &[u8]) -> u128;
}

/// XXHash3 hasher - extremely fast, good for content keys.
pub struct XxHash3;

impl XxHash3 {
    /// Create a new XXHash3 hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for XxHash3 {
    fn default() -> Self {
        Self::new()
    }
}

impl HashFunction for XxHash3 {
    fn hash_u64(&self, data: &[u8]) -> u64 {
        xxhash_rust::xxh3::xxh3_64(data)
    }

    fn hash_u128(&self, data: &[u8]) -> u128 {
        xxhash_rust::xxh3::xxh3_128(data)
    }
}

/// Hash with seed for MinHash-style algorithms.
#[inline]
pub fn hash_with_seed(data: &[u8], seed: u64) -> u64 {
    xxhash_rust::xxh3::xxh3_64_with_seed(data, seed)
}
