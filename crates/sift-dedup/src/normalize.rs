//! Text normalization applied before shingling.
//!
//! The transform order is fixed: lowercase, strip non-word characters,
//! collapse whitespace, then fold to ASCII. Raw text is never modified;
//! normalized text is only used for comparison.

use deunicode::deunicode_with_tofu;
use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;

static NON_WORD_REGEX: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();

fn non_word_regex() -> &'static Regex {
    NON_WORD_REGEX.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex"))
}

fn whitespace_regex() -> &'static Regex {
    WHITESPACE_REGEX.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Normalize text for near-duplicate comparison.
///
/// 1. lowercase
/// 2. remove every character that is neither a word character nor whitespace
/// 3. collapse whitespace runs to a single space and trim
/// 4. transliterate non-ASCII characters to their closest ASCII spelling, then
///    repeat steps 1-3 on the result
///
/// Normalizing an already-normalized string returns it unchanged.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase();
    let stripped = non_word_regex().replace_all(&lowered, "");
    let collapsed = collapse_whitespace(&stripped);
    if collapsed.is_ascii() {
        return collapsed;
    }

    // Transliterations can reintroduce capitals, symbols and stray spaces
    // ("東京" becomes "Dong Jing "), so the ASCII text goes through the
    // same steps once more.
    let folded = fold_to_ascii(&collapsed).to_lowercase();
    let stripped = non_word_regex().replace_all(&folded, "");
    collapse_whitespace(&stripped)
}

/// Collapse runs of whitespace into one space and trim both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    whitespace_regex().replace_all(text, " ").trim().to_string()
}

/// Transliterate text to ASCII.
///
/// Combining marks are dropped, then every remaining non-ASCII character is
/// replaced by its closest ASCII spelling (`ß` → `ss`, `Ł` → `L`, `東` →
/// `Dong `). Characters with no known spelling are removed. Output case and
/// spacing are whatever the transliteration table produces.
#[must_use]
pub fn fold_to_ascii(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let unmarked: String = text.chars().filter(|&c| !is_combining_mark(c)).collect();
    deunicode_with_tofu(&unmarked, "")
}
