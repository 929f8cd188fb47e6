use memchr::memmem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use unicode_segmentation::UnicodeSegmentation;

/// Maximum indexed word length in characters.
/// Longer runs are session ids, hashes, or base64 and are truncated.
pub const MAX_WORD_LENGTH: usize = 64;

/// Matches are only reported when they start within this many bytes of the text
pub const MAX_COMPARE_LENGTH: usize = 2048;

/// URL prefixes after which a match still counts as the start of the URL
const INLINEABLE_PREFIXES: &[&str] = &[
    "ftp://",
    "ftp://www.",
    "ftp://ftp.",
    "http://",
    "http://www.",
    "https://",
    "https://www.",
];

/// One occurrence of a typed term inside a URL or title.
/// `offset` and `length` are byte positions in the lower-cased text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMatch {
    pub term_num: usize,
    pub offset: usize,
    pub length: usize,
}

impl TermMatch {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Break text into words.
///
/// With `break_on_space` the text is split on whitespace only, keeping
/// punctuation such as `http://` inside the chunk. Otherwise it is segmented
/// on Unicode word boundaries and each word is cut further at every
/// non-alphanumeric character, which is the form used for indexing.
pub fn words_from(text: &str, break_on_space: bool) -> Vec<String> {
    if break_on_space {
        return text.split_whitespace().map(str::to_owned).collect();
    }

    text.unicode_words()
        .flat_map(|word| word.split(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(|word| truncate_chars(word, MAX_WORD_LENGTH).to_owned())
        .collect()
}

/// Distinct words of `text`, as used for the index
pub fn word_set_from(text: &str) -> BTreeSet<String> {
    words_from(text, false).into_iter().collect()
}

/// Distinct characters of a word
pub fn char_set_from(word: &str) -> BTreeSet<char> {
    word.chars().collect()
}

fn truncate_chars(word: &str, max_chars: usize) -> &str {
    match word.char_indices().nth(max_chars) {
        Some((end, _)) => &word[..end],
        None => word,
    }
}

/// Find every occurrence of `term` in `text`, overlapping ones included.
/// Both sides must already be case-folded.
pub fn match_term(term: &str, text: &str, term_num: usize) -> Vec<TermMatch> {
    let mut matches = Vec::new();
    if term.is_empty() {
        return matches;
    }

    let finder = memmem::Finder::new(term.as_bytes());
    let haystack = text.as_bytes();
    let mut start = 0;
    while start < haystack.len().min(MAX_COMPARE_LENGTH) {
        let Some(pos) = finder.find(&haystack[start..]) else {
            break;
        };
        let offset = start + pos;
        if offset >= MAX_COMPARE_LENGTH {
            break;
        }
        matches.push(TermMatch {
            term_num,
            offset,
            length: term.len(),
        });
        start = offset + 1;
    }
    matches
}

/// Sort by offset and drop every match that starts inside an earlier kept one
pub fn deoverlap(mut matches: Vec<TermMatch>) -> Vec<TermMatch> {
    matches.sort_by_key(|m| m.offset);
    let mut kept: Vec<TermMatch> = Vec::with_capacity(matches.len());
    for m in matches {
        match kept.last() {
            Some(last) if m.offset < last.end() => {}
            _ => kept.push(m),
        }
    }
    kept
}

pub fn is_inlineable_prefix(prefix: &str) -> bool {
    INLINEABLE_PREFIXES.contains(&prefix)
}
