use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Keywords kept per polarity class.
pub const TOP_KEYWORDS: usize = 5;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"));

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does",
    "doing", "dont", "for", "from", "get", "got", "had", "has", "have", "having", "he", "her",
    "here", "him", "his", "how", "i", "if", "im", "in", "into", "is", "it", "its", "ive", "just",
    "me", "more", "most", "my", "no", "nor", "not", "now", "of", "off", "on", "one", "only", "or",
    "other", "our", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "why", "will", "with", "would", "you", "your",
];

/// Most frequent non-stop-words across `texts`, ties broken by first appearance.
///
/// Text is lowercased and stripped of punctuation before splitting on
/// whitespace.
#[must_use]
pub fn top_keywords<'a, I>(texts: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = texts.into_iter().collect::<Vec<_>>().join(" ").to_lowercase();
    let cleaned = PUNCTUATION.replace_all(&joined, "");

    // word -> (count, first index)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, word) in cleaned
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .enumerate()
    {
        counts.entry(word).or_insert((0, index)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(word, _, _)| word.to_string())
        .collect()
}
