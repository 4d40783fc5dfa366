//! Fuzzy lookup of a free-form query in a user's saved dishes.
//!
//! Russian food names come in many inflected forms ("пшеничная каша",
//! "пшеничной каши"), so besides plain substring containment two words are
//! considered equal when they share a short leading stem.

/// Number of leading characters compared by the stem rule.
pub const MIN_STEM_LEN: usize = 3;

/// First `MIN_STEM_LEN` characters (not bytes) of a word.
fn stem(word: &str) -> &str {
    match word.char_indices().nth(MIN_STEM_LEN) {
        Some((idx, _)) => &word[..idx],
        None => word,
    }
}

fn words(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

/// Whether two words share a stem, checked in both directions.
pub fn words_share_stem(query_word: &str, name_word: &str) -> bool {
    let q_stem = stem(query_word);
    let n_stem = stem(name_word);
    n_stem == q_stem || name_word.starts_with(q_stem) || query_word.starts_with(n_stem)
}

/// Every query word must have some name word with a shared stem.
///
/// An empty query only matches an empty name.
pub fn tokens_match(query_words: &[&str], name_words: &[&str]) -> bool {
    if query_words.is_empty() {
        return name_words.is_empty();
    }
    query_words
        .iter()
        .all(|qw| name_words.iter().any(|nw| words_share_stem(qw, nw)))
}

/// Match predicate on already lowercased, trimmed strings.
pub fn name_matches(query: &str, name: &str) -> bool {
    if query.is_empty() || name.is_empty() {
        return query.is_empty() && name.is_empty();
    }
    if name.contains(query) || query.contains(name) {
        return true;
    }
    let query_words = words(query);
    let name_words = words(name);
    !query_words.is_empty() && !name_words.is_empty() && tokens_match(&query_words, &name_words)
}

pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// First candidate (in the given order) whose name matches the query.
///
/// Callers pass candidates sorted by name. A blank query never matches.
pub fn find_match<'a, T, F>(candidates: &'a [T], query: &str, name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let query = normalize(query);
    if query.is_empty() {
        return None;
    }
    candidates
        .iter()
        .find(|c| name_matches(&query, &normalize(name_of(*c))))
}
