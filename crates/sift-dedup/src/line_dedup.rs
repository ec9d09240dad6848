//! Exact line deduplication across a corpus of text files.
//!
//! A line survives only if its exact text (case and whitespace included)
//! occurs once in the whole input set. Two passes: the first counts every
//! line, the second rewrites each file with its unique lines.

use crate::io::check_unique_names;
use serde::{Deserialize, Serialize};
use sift_core::hashing::{HashFunction, XxHash3};
use sift_core::{Result, SiftError};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Statistics from exact line deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDedupStats {
    /// Files rewritten to the output directory.
    pub files: usize,
    /// Files that could not be opened and were skipped.
    pub skipped_files: usize,
    /// Lines read in the counting pass.
    pub lines_read: usize,
    /// Lines written to output files.
    pub lines_written: usize,
    /// Distinct lines seen across the corpus.
    pub distinct_lines: usize,
}

impl LineDedupStats {
    /// Lines dropped as duplicates.
    #[must_use]
    pub fn lines_removed(&self) -> usize {
        self.lines_read.saturating_sub(self.lines_written)
    }
}

/// Corpus-wide line occurrence counts.
///
/// Lines are keyed by a 128-bit digest, so memory grows with the number of
/// distinct lines and not with their length.
#[derive(Default)]
pub struct LineCounter {
    counts: HashMap<u128, u32>,
    hasher: XxHash3,
}

impl LineCounter {
    /// Create an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `line`.
    pub fn add(&mut self, line: &str) {
        let key = self.hasher.hash_u128(line.as_bytes());
        let count = self.counts.entry(key).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Number of recorded occurrences of `line`.
    #[must_use]
    pub fn count(&self, line: &str) -> u32 {
        let key = self.hasher.hash_u128(line.as_bytes());
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Whether `line` occurred exactly once.
    #[must_use]
    pub fn is_unique(&self, line: &str) -> bool {
        self.count(line) == 1
    }

    /// Number of distinct lines recorded.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }
}

/// Feed every line of `reader` to `f`.
///
/// Lines are split on `\n`, which is not part of the line; a final line
/// without a trailing newline still counts. Malformed UTF-8 is replaced.
fn for_each_line<R: BufRead>(mut reader: R, mut f: impl FnMut(&str)) -> std::io::Result<usize> {
    let mut buf = Vec::new();
    let mut lines = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        let line: Cow<'_, str> = String::from_utf8_lossy(&buf);
        f(&line);
        lines += 1;
    }

    Ok(lines)
}

/// Open a file for the line passes, logging and returning `None` if it is
/// unreadable.
fn open_input(path: &Path) -> Option<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Some(BufReader::new(file)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable document");
            None
        }
    }
}

/// Remove every line that occurs more than once across `inputs`.
///
/// Writes `output_dir/<file name>` for each readable input, containing the
/// lines whose corpus-wide count is exactly one, in their original order,
/// each terminated by `\n`. Files whose lines are all duplicates produce an
/// empty output file. Inputs are never modified.
pub fn exact_line_dedup<P: AsRef<Path>>(inputs: &[PathBuf], output_dir: P) -> Result<LineDedupStats> {
    let output_dir = output_dir.as_ref();
    check_unique_names(inputs)?;

    let mut stats = LineDedupStats::default();
    let mut counter = LineCounter::new();
    let mut readable = Vec::with_capacity(inputs.len());

    // Pass 1: count.
    for path in inputs {
        let Some(reader) = open_input(path) else {
            stats.skipped_files += 1;
            continue;
        };
        stats.lines_read +=
            for_each_line(reader, |line| counter.add(line)).map_err(|e| SiftError::io(path, e))?;
        readable.push(path);
    }
    stats.distinct_lines = counter.distinct();

    fs::create_dir_all(output_dir).map_err(|e| SiftError::io(output_dir, e))?;

    // Pass 2: keep lines seen once.
    for path in readable {
        let Some(reader) = open_input(path) else {
            stats.skipped_files += 1;
            continue;
        };
        let name = path.file_name().ok_or_else(|| {
            SiftError::InvalidInput(format!("input has no file name: {}", path.display()))
        })?;
        let target = output_dir.join(name);
        let file = File::create(&target).map_err(|e| SiftError::io(&target, e))?;
        let mut writer = BufWriter::new(file);

        let mut write_err = None;
        for_each_line(reader, |line| {
            if write_err.is_some() || !counter.is_unique(line) {
                return;
            }
            match writer
                .write_all(line.as_bytes())
                .and_then(|()| writer.write_all(b"\n"))
            {
                Ok(()) => stats.lines_written += 1,
                Err(e) => write_err = Some(e),
            }
        })
        .map_err(|e| SiftError::io(path, e))?;

        if let Some(e) = write_err {
            return Err(SiftError::io(&target, e));
        }
        writer.flush().map_err(|e| SiftError::io(&target, e))?;
        stats.files += 1;
    }

    info!(
        files = stats.files,
        skipped = stats.skipped_files,
        lines_read = stats.lines_read,
        lines_written = stats.lines_written,
        "exact line deduplication finished"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_inputs(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_line_counter() {
        let mut counter = LineCounter::new();
        counter.add("a");
        counter.add("a");
        counter.add("b");

        assert_eq!(counter.count("a"), 2);
        assert_eq!(counter.count("b"), 1);
        assert_eq!(counter.count("c"), 0);
        assert!(counter.is_unique("b"));
        assert!(!counter.is_unique("a"));
        assert_eq!(counter.distinct(), 2);
    }

    #[test]
    fn test_for_each_line_splitting() {
        let mut lines = Vec::new();
        let n = for_each_line("a\n\nb\r\nc".as_bytes(), |l| lines.push(l.to_string())).unwrap();

        assert_eq!(n, 4);
        assert_eq!(lines, vec!["a", "", "b\r", "c"]);

        let n = for_each_line("".as_bytes(), |_| {}).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_exact_line_dedup_example() {
        let temp = TempDir::new().unwrap();
        let inputs = write_inputs(temp.path(), &[("1.txt", "a\nb\na\n"), ("2.txt", "b\nc\n")]);
        let out = temp.path().join("out");

        let stats = exact_line_dedup(&inputs, &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("1.txt")).unwrap(), "");
        assert_eq!(fs::read_to_string(out.join("2.txt")).unwrap(), "c\n");
        assert_eq!(stats.files, 2);
        assert_eq!(stats.lines_read, 5);
        assert_eq!(stats.lines_written, 1);
        assert_eq!(stats.lines_removed(), 4);
        assert_eq!(stats.distinct_lines, 3);
    }

    #[test]
    fn test_case_and_whitespace_are_significant() {
        let temp = TempDir::new().unwrap();
        let inputs = write_inputs(
            temp.path(),
            &[("x.txt", "Hello\nhello\n"), ("y.txt", "hello \nHello\n")],
        );
        let out = temp.path().join("out");

        exact_line_dedup(&inputs, &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("x.txt")).unwrap(), "hello\n");
        assert_eq!(fs::read_to_string(out.join("y.txt")).unwrap(), "hello \n");
    }

    #[test]
    fn test_preserves_order_and_missing_trailing_newline() {
        let temp = TempDir::new().unwrap();
        let inputs = write_inputs(
            temp.path(),
            &[("doc.txt", "third\nfirst\nshared\nsecond"), ("other.txt", "shared\n")],
        );
        let out = temp.path().join("out");

        exact_line_dedup(&inputs, &out).unwrap();

        assert_eq!(
            fs::read_to_string(out.join("doc.txt")).unwrap(),
            "third\nfirst\nsecond\n"
        );
        assert_eq!(fs::read_to_string(out.join("other.txt")).unwrap(), "");
    }

    #[test]
    fn test_inputs_untouched() {
        let temp = TempDir::new().unwrap();
        let inputs = write_inputs(temp.path(), &[("a.txt", "x\nx\n")]);
        let out = temp.path().join("out");

        exact_line_dedup(&inputs, &out).unwrap();

        assert_eq!(fs::read_to_string(&inputs[0]).unwrap(), "x\nx\n");
    }

    #[test]
    fn test_unreadable_input_skipped() {
        let temp = TempDir::new().unwrap();
        let mut inputs = write_inputs(temp.path(), &[("a.txt", "only\n")]);
        inputs.push(temp.path().join("missing.txt"));
        let out = temp.path().join("out");

        let stats = exact_line_dedup(&inputs, &out).unwrap();

        assert_eq!(stats.files, 1);
        assert_eq!(stats.skipped_files, 1);
        assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "only\n");
        assert!(!out.join("missing.txt").exists());
    }

    #[test]
    fn test_duplicate_output_names_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("p")).unwrap();
        fs::create_dir(temp.path().join("q")).unwrap();
        let inputs = write_inputs(temp.path(), &[("p/same.txt", "a\n"), ("q/same.txt", "b\n")]);
        let out = temp.path().join("out");

        let err = exact_line_dedup(&inputs, &out).unwrap_err();

        assert!(matches!(err, SiftError::InvalidInput(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_empty_input_set() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");

        let stats = exact_line_dedup(&[], &out).unwrap();

        assert_eq!(stats, LineDedupStats::default());
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }
}
