//! File-level deduplication stages.
//!
//! [`minhash_dedup_files`] removes near-duplicate documents from a set of
//! files; [`run_pipeline`] chains exact line deduplication and the MinHash
//! stage through a temporary staging directory.

use crate::io::{
    check_unique_names, collect_input_files, load_documents, prepare_output_dir, write_survivors,
};
use crate::line_dedup::{exact_line_dedup, LineDedupStats};
use crate::{DedupConfig, DedupStats, Deduplicator};
use serde::Serialize;
use sift_core::{Result, SiftError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of the MinHash file stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MinhashDedupReport {
    /// Counts from the deduplication run.
    pub stats: DedupStats,
    /// Inputs that could not be read.
    pub skipped: Vec<PathBuf>,
    /// Survivor files written to the output directory.
    pub written: Vec<PathBuf>,
}

/// Outcome of the full line + MinHash pipeline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Exact line deduplication counts.
    pub lines: LineDedupStats,
    /// MinHash stage over the line-deduplicated files.
    pub minhash: MinhashDedupReport,
}

/// Remove near-duplicate documents, copying survivors to `output_dir`.
///
/// Each file is one document. The configuration is validated before any
/// input is touched. Survivors are copied byte for byte; nothing is written
/// for removed or unreadable documents.
pub fn minhash_dedup_files<P: AsRef<Path>>(
    inputs: &[PathBuf],
    config: &DedupConfig,
    output_dir: P,
) -> Result<MinhashDedupReport> {
    let dedup = Deduplicator::new(config.clone())?;
    let output_dir = output_dir.as_ref();

    let files = collect_input_files(inputs)?;
    check_unique_names(&files)?;
    debug!(files = files.len(), "collected input files");

    let corpus = load_documents(&files);
    let result = dedup.deduplicate_documents(&corpus.documents);

    prepare_output_dir(output_dir)?;
    let written = write_survivors(&corpus.documents, &result.keep_indices, output_dir)?;

    info!(
        kept = written.len(),
        removed = result.stats.duplicate_count,
        skipped = corpus.skipped.len(),
        "minhash deduplication finished"
    );

    Ok(MinhashDedupReport {
        stats: result.stats,
        skipped: corpus.skipped.into_iter().map(|s| s.path).collect(),
        written,
    })
}

/// Run exact line deduplication, then MinHash deduplication.
///
/// Line-deduplicated files are staged in a temporary directory that is
/// removed when the run ends; only the final survivors land in
/// `output_dir`.
pub fn run_pipeline<P: AsRef<Path>>(
    inputs: &[PathBuf],
    config: &DedupConfig,
    output_dir: P,
) -> Result<PipelineReport> {
    config.validate()?;
    let output_dir = output_dir.as_ref();

    let files = collect_input_files(inputs)?;
    let staging = tempfile::tempdir().map_err(|e| SiftError::io(std::env::temp_dir(), e))?;
    debug!(dir = %staging.path().display(), "staging line-deduplicated files");

    let lines = exact_line_dedup(&files, staging.path())?;

    let staged: Vec<PathBuf> = files
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| staging.path().join(name))
        .filter(|path| path.is_file())
        .collect();

    let minhash = minhash_dedup_files(&staged, config, output_dir)?;

    staging
        .close()
        .map_err(|e| SiftError::io(std::env::temp_dir(), e))?;

    Ok(PipelineReport { lines, minhash })
}
