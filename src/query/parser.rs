use crate::utils::words_from;

/// A typed query, normalized for lookup and scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Lower-cased query text
    pub lower: String,
    /// Alphanumeric words used to find candidates, longest first, deduplicated
    pub lookup_words: Vec<String>,
    /// Whitespace-delimited terms every match must contain as substrings,
    /// in typed order with repeats removed
    pub terms: Vec<String>,
    /// The raw query ended in whitespace, which disables inline completion
    pub trailing_whitespace: bool,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.lookup_words.is_empty() || self.terms.is_empty()
    }
}

/// Normalize `text` into lookup words and scoring terms.
///
/// "atdmt.view" looks up candidates through the words "atdmt" and "view"
/// but only matches rows containing the literal "atdmt.view".
pub fn parse_query(text: &str) -> ParsedQuery {
    let lower = text.to_lowercase();

    let mut lookup_words = words_from(&lower, false);
    lookup_words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    lookup_words.dedup();

    let mut terms: Vec<String> = Vec::new();
    for term in words_from(&lower, true) {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    let trailing_whitespace = text.chars().last().is_some_and(char::is_whitespace);

    ParsedQuery {
        lower,
        lookup_words,
        terms,
        trailing_whitespace,
    }
}
