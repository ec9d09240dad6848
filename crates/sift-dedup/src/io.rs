//! File I/O for document corpora.
//!
//! Each input file is one document. Files are read as UTF-8 with lossy
//! decoding; a file that cannot be read at all is skipped with a warning
//! instead of failing the run.

use crate::lsh::DocId;
use sift_core::{Result, SiftError};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A document loaded from a source file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Position of the source file in the input list.
    pub id: DocId,
    /// Path the document was read from.
    pub path: PathBuf,
    /// Raw text, never modified after loading.
    pub text: String,
}

impl SourceDocument {
    /// Create a new document.
    #[must_use]
    pub fn new(id: DocId, path: impl Into<PathBuf>, text: String) -> Self {
        Self {
            id,
            path: path.into(),
            text,
        }
    }

    /// File name used for the document's output file.
    #[must_use]
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// A source file that could not be loaded.
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    /// Path that failed to load.
    pub path: PathBuf,
    /// Error message from the failed read.
    pub reason: String,
}

/// Documents loaded from a set of input files.
#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    /// Readable documents in input order.
    pub documents: Vec<SourceDocument>,
    /// Files that were skipped.
    pub skipped: Vec<SkippedDocument>,
}

/// Expand input paths into the list of files to process.
///
/// Directories contribute their regular, non-hidden files (not recursive),
/// sorted by name. Files are taken as given. A missing path is an error.
pub fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let meta = fs::metadata(input).map_err(|e| SiftError::io(input, e))?;
        if !meta.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(input).map_err(|e| SiftError::io(input, e))? {
            let entry = entry.map_err(|e| SiftError::io(input, e))?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if path.is_file() && !hidden {
                entries.push(path);
            }
        }
        entries.sort();
        debug!(dir = %input.display(), files = entries.len(), "expanded input directory");
        files.extend(entries);
    }

    Ok(files)
}

/// Fail if two inputs would write to the same output file name.
pub fn check_unique_names(paths: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<OsString, &Path> = HashMap::new();

    for path in paths {
        let name = path.file_name().ok_or_else(|| {
            SiftError::InvalidInput(format!("input has no file name: {}", path.display()))
        })?;
        if let Some(previous) = seen.insert(name.to_os_string(), path) {
            return Err(SiftError::InvalidInput(format!(
                "inputs {} and {} share the output name {}",
                previous.display(),
                path.display(),
                name.to_string_lossy()
            )));
        }
    }

    Ok(())
}

/// Read a file as text, replacing malformed UTF-8 sequences.
pub fn read_text_lossy<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| SiftError::io(path, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Load one document per file; unreadable files are skipped.
///
/// Document ids are positions in `paths`, so they stay stable when some
/// files are skipped.
#[must_use]
pub fn load_documents(paths: &[PathBuf]) -> LoadedCorpus {
    let mut corpus = LoadedCorpus::default();

    for (id, path) in paths.iter().enumerate() {
        match read_text_lossy(path) {
            Ok(text) => corpus.documents.push(SourceDocument::new(id, path, text)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable document");
                corpus.skipped.push(SkippedDocument {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    corpus
}

/// Create the output directory.
///
/// Existing entries are left in place but reported: a run is only complete
/// when it started from an empty directory.
pub fn prepare_output_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| SiftError::io(dir, e))?;

    let existing = fs::read_dir(dir).map_err(|e| SiftError::io(dir, e))?.count();
    if existing > 0 {
        warn!(
            dir = %dir.display(),
            entries = existing,
            "output directory is not empty; earlier results may be mixed in"
        );
    }

    Ok(())
}

/// Copy each kept document's source file, byte for byte, into `output_dir`.
///
/// `keep_indices` index into `docs`. Returns the written paths.
pub fn write_survivors<P: AsRef<Path>>(
    docs: &[SourceDocument],
    keep_indices: &[usize],
    output_dir: P,
) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    let mut written = Vec::with_capacity(keep_indices.len());

    for &i in keep_indices {
        let doc = &docs[i];
        let name = doc.file_name().ok_or_else(|| {
            SiftError::InvalidInput(format!("input has no file name: {}", doc.path.display()))
        })?;
        let target = output_dir.join(name);
        fs::copy(&doc.path, &target).map_err(|e| SiftError::io(&doc.path, e))?;
        written.push(target);
    }

    Ok(written)
}

/// Write a text file through a buffered writer.
pub fn write_text<P: AsRef<Path>>(path: P, text: &str) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SiftError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(text.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| SiftError::io(path, e))
}
