//! Document cleaning heuristics.
//!
//! Line-level cleaning in the style of C4, the Gopher quality rules, a
//! bad-word list and PII masking. [`clean_document`] applies them in order
//! to one document; [`clean_files`] runs them over a set of files.

use crate::io::{
    check_unique_names, collect_input_files, load_documents, prepare_output_dir, write_text,
};
use crate::pii::{mask_all, PiiCounts};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sift_core::{Result, SiftError};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TERMINAL_PUNCTUATION: [char; 6] = ['.', '!', '?', '"', '\u{2019}', '\u{201D}'];

/// Line-level cleaning rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineFilter {
    /// Minimum words for a line to be kept.
    pub min_words: usize,
    /// Minimum sentences in the cleaned document.
    pub min_sentences: usize,
}

impl Default for LineFilter {
    fn default() -> Self {
        Self {
            min_words: 3,
            min_sentences: 5,
        }
    }
}

impl LineFilter {
    /// Whether a trimmed line survives cleaning.
    #[must_use]
    pub fn keeps(&self, line: &str) -> bool {
        !line.is_empty()
            && line.ends_with(TERMINAL_PUNCTUATION)
            && line.split_whitespace().count() >= self.min_words
            && !is_junk_line(line)
    }

    /// Keep the trimmed lines that pass [`LineFilter::keeps`], joined by `\n`.
    #[must_use]
    pub fn clean_lines(&self, text: &str) -> String {
        text.split('\n')
            .map(str::trim)
            .filter(|line| self.keeps(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn is_junk_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("javascript") || lower.contains("lorem ipsum") || line.contains(['{', '}'])
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Count sentences.
///
/// A sentence ends at whitespace that follows `.` or `?`, unless the period
/// closes an abbreviation: a dotted initialism like `e.g.`, or a capitalised
/// short form like `Mr.`. Empty text has no sentences.
#[must_use]
pub fn count_sentences(text: &str) -> usize {
    let chars: Vec<char> = text.trim().chars().collect();
    if chars.is_empty() {
        return 0;
    }

    let mut count = 1;
    for i in 1..chars.len() {
        if !chars[i].is_whitespace() || !matches!(chars[i - 1], '.' | '?') {
            continue;
        }
        let initialism = i >= 4
            && is_word_char(chars[i - 4])
            && chars[i - 3] == '.'
            && is_word_char(chars[i - 2]);
        let title = i >= 3
            && chars[i - 3].is_uppercase()
            && chars[i - 2].is_lowercase()
            && chars[i - 1] == '.';
        if !initialism && !title {
            count += 1;
        }
    }
    count
}

/// Gopher quality rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GopherFilter {
    pub min_words: usize,
    pub max_words: usize,
    pub min_mean_word_len: f64,
    pub max_mean_word_len: f64,
    /// Maximum fraction of lines ending in `...`.
    pub max_ellipsis_line_ratio: f64,
    /// Minimum fraction of words containing an ASCII letter.
    pub min_alpha_word_ratio: f64,
}

impl Default for GopherFilter {
    fn default() -> Self {
        Self {
            min_words: 50,
            max_words: 100_000,
            min_mean_word_len: 3.0,
            max_mean_word_len: 10.0,
            max_ellipsis_line_ratio: 0.3,
            min_alpha_word_ratio: 0.8,
        }
    }
}

impl GopherFilter {
    /// Whether `text` passes every rule.
    #[must_use]
    pub fn passes(&self, text: &str) -> bool {
        self.check(text).is_ok()
    }

    /// Name of the first rule `text` fails.
    pub fn check(&self, text: &str) -> std::result::Result<(), &'static str> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() < self.min_words || words.len() > self.max_words {
            return Err("word count");
        }

        let total_len: usize = words.iter().map(|w| w.chars().count()).sum();
        let mean = total_len as f64 / words.len() as f64;
        if mean < self.min_mean_word_len || mean > self.max_mean_word_len {
            return Err("mean word length");
        }

        let lines: Vec<&str> = text.split('\n').collect();
        let ellipsis = lines
            .iter()
            .filter(|line| line.trim_end().ends_with("..."))
            .count();
        if ellipsis as f64 / lines.len() as f64 > self.max_ellipsis_line_ratio {
            return Err("ellipsis lines");
        }

        let alpha = words
            .iter()
            .filter(|w| w.chars().any(|c| c.is_ascii_alphabetic()))
            .count();
        if (alpha as f64 / words.len() as f64) < self.min_alpha_word_ratio {
            return Err("alphabetic words");
        }

        Ok(())
    }
}

/// Lowercase phrases whose presence rejects a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadWords {
    phrases: BTreeSet<String>,
}

impl BadWords {
    /// Build a list from phrases; blank entries are ignored.
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// Load one phrase per line.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SiftError::io(path, e))?;
        let words = Self::from_phrases(content.lines());
        debug!(path = %path.display(), phrases = words.len(), "loaded bad-word list");
        Ok(words)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Case-insensitive substring test against every phrase.
    #[must_use]
    pub fn contains_any(&self, text: &str) -> bool {
        if self.phrases.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.phrases.iter().any(|p| lower.contains(p.as_str()))
    }
}

/// Configuration for document cleaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanConfig {
    pub lines: LineFilter,
    /// Apply the Gopher rules to the cleaned text.
    pub gopher: Option<GopherFilter>,
    /// Mask emails, phone numbers and IP addresses in kept documents.
    pub mask_pii: bool,
    #[serde(skip)]
    pub bad_words: Option<BadWords>,
}

impl CleanConfig {
    #[must_use]
    pub fn with_gopher(mut self, enabled: bool) -> Self {
        self.gopher = enabled.then(GopherFilter::default);
        self
    }

    #[must_use]
    pub fn with_mask_pii(mut self, enabled: bool) -> Self {
        self.mask_pii = enabled;
        self
    }

    #[must_use]
    pub fn with_bad_words(mut self, words: BadWords) -> Self {
        self.bad_words = Some(words);
        self
    }

    #[must_use]
    pub fn with_min_sentences(mut self, n: usize) -> Self {
        self.lines.min_sentences = n;
        self
    }
}

/// Why a document was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TooFewSentences,
    BadWords,
    LowQuality,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TooFewSentences => "too few sentences",
            Self::BadWords => "bad words",
            Self::LowQuality => "low quality",
        };
        f.write_str(s)
    }
}

/// Result of cleaning one document.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanOutcome {
    Kept { text: String, pii: PiiCounts },
    Rejected(RejectReason),
}

/// Clean one document.
///
/// Order: line cleaning, sentence count, bad words, Gopher rules, then PII
/// masking of the surviving text.
#[must_use]
pub fn clean_document(text: &str, config: &CleanConfig) -> CleanOutcome {
    let cleaned = config.lines.clean_lines(text);

    if count_sentences(&cleaned) < config.lines.min_sentences {
        return CleanOutcome::Rejected(RejectReason::TooFewSentences);
    }
    if let Some(words) = &config.bad_words {
        if words.contains_any(&cleaned) {
            return CleanOutcome::Rejected(RejectReason::BadWords);
        }
    }
    if let Some(gopher) = &config.gopher {
        if let Err(rule) = gopher.check(&cleaned) {
            debug!(rule, "gopher rule failed");
            return CleanOutcome::Rejected(RejectReason::LowQuality);
        }
    }

    if config.mask_pii {
        let (text, pii) = mask_all(&cleaned);
        CleanOutcome::Kept { text, pii }
    } else {
        CleanOutcome::Kept {
            text: cleaned,
            pii: PiiCounts::default(),
        }
    }
}

/// Statistics from cleaning a set of files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanStats {
    pub documents: usize,
    pub kept: usize,
    /// Unreadable inputs.
    pub skipped: usize,
    pub too_few_sentences: usize,
    pub bad_words: usize,
    pub low_quality: usize,
    pub pii: PiiCounts,
}

impl CleanStats {
    fn record(&mut self, outcome: &CleanOutcome) {
        match outcome {
            CleanOutcome::Kept { pii, .. } => {
                self.kept += 1;
                self.pii.add(*pii);
            }
            CleanOutcome::Rejected(RejectReason::TooFewSentences) => self.too_few_sentences += 1,
            CleanOutcome::Rejected(RejectReason::BadWords) => self.bad_words += 1,
            CleanOutcome::Rejected(RejectReason::LowQuality) => self.low_quality += 1,
        }
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.too_few_sentences + self.bad_words + self.low_quality
    }
}

/// Clean every input document, writing kept documents to `output_dir`.
///
/// Each kept document is written under its source file name with a trailing
/// newline. Documents are cleaned in parallel and written in input order.
pub fn clean_files<P: AsRef<Path>>(
    inputs: &[PathBuf],
    config: &CleanConfig,
    output_dir: P,
) -> Result<CleanStats> {
    let output_dir = output_dir.as_ref();

    let files = collect_input_files(inputs)?;
    check_unique_names(&files)?;
    let corpus = load_documents(&files);

    let outcomes: Vec<CleanOutcome> = corpus
        .documents
        .par_iter()
        .map(|doc| clean_document(&doc.text, config))
        .collect();

    prepare_output_dir(output_dir)?;

    let mut stats = CleanStats {
        documents: corpus.documents.len(),
        skipped: corpus.skipped.len(),
        ..CleanStats::default()
    };

    for (doc, outcome) in corpus.documents.iter().zip(&outcomes) {
        stats.record(outcome);
        match outcome {
            CleanOutcome::Kept { text, .. } => {
                let name = doc.file_name().ok_or_else(|| {
                    SiftError::InvalidInput(format!(
                        "input has no file name: {}",
                        doc.path.display()
                    ))
                })?;
                write_text(output_dir.join(name), &format!("{text}\n"))?;
            }
            CleanOutcome::Rejected(reason) => {
                debug!(path = %doc.path.display(), %reason, "document rejected");
            }
        }
    }

    info!(
        documents = stats.documents,
        kept = stats.kept,
        rejected = stats.rejected(),
        masked = stats.pii.total(),
        "cleaning finished"
    );

    Ok(stats)
}
