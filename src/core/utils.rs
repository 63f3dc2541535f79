use std::{
    collections::HashSet,
    sync::OnceLock,
};

use regex::Regex;

fn punctuation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // \w is Unicode-aware, so kana, kanji and accented letters survive
    RE.get_or_init(|| Regex::new(r"[^\w\s]").unwrap())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replaces punctuation with spaces and collapses the result.
pub fn strip_punctuation(text: &str) -> String {
    collapse_whitespace(&punctuation_regex().replace_all(text, " "))
}

/// Cleans generated sentences: whitespace collapsed, blanks dropped and
/// case-insensitive repeats removed, keeping the first occurrence.
pub fn dedup_sentences<I, S>(sentences: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    sentences
        .into_iter()
        .map(|s| collapse_whitespace(s.as_ref()))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}
