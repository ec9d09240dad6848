//! # sift-core
//!
//! Shared infrastructure for the sift corpus tools.
//!
//! Provides:
//! - The workspace error type ([`SiftError`]) and [`Result`] alias
//! - Hashing primitives (xxh3) used for shingles, LSH bands and line digests

pub mod error;
pub mod hashing;

pub use error::{Result, SiftError};
pub use hashing::{hash_with_seed, HashFunction, XxHash3};
