use std::collections::{BTreeSet, HashSet};

/// Stop words dropped from query tokens.
pub const DEFAULT_STOP_WORDS: [&str; 30] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// Lowercased, trimmed query text.
    pub lower_text: String,
    /// Non-stop-word tokens, iterated in sorted order.
    pub tokens: BTreeSet<String>,
    /// Matched against [`phrase_haystack`] of the content, so stop words on
    /// either side never break a phrase.
    pub phrase: String,
}

impl NormalizedQuery {
    pub fn sorted_token_run(&self) -> String {
        self.tokens
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Strips punctuation around a word, keeping inner characters such as
/// `498a` or `co-operative`.
pub fn clean_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Distinct lowercase words of `text`.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(clean_word)
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Text the query phrase is searched in: the content's words with stop
/// words removed, or the whitespace-collapsed content when the query itself
/// was made only of stop words.
pub fn phrase_haystack(
    lower_content: &str,
    query: &NormalizedQuery,
    stop_words: &HashSet<String>,
) -> String {
    let words = lower_content.split_whitespace();
    if query.tokens.is_empty() {
        return words.collect::<Vec<_>>().join(" ");
    }
    words
        .map(clean_word)
        .filter(|word| !word.is_empty() && !stop_words.contains(*word))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_query(raw: &str, stop_words: &HashSet<String>) -> NormalizedQuery {
    let lower_text = raw.trim().to_lowercase();

    let words: Vec<&str> = lower_text
        .split_whitespace()
        .map(clean_word)
        .filter(|word| !word.is_empty())
        .collect();

    let content_words: Vec<&str> = words
        .iter()
        .copied()
        .filter(|word| !stop_words.contains(*word))
        .collect();

    let phrase = if content_words.is_empty() {
        lower_text.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        content_words.join(" ")
    };

    NormalizedQuery {
        tokens: content_words.iter().map(|word| word.to_string()).collect(),
        lower_text,
        phrase,
    }
}
