//! Keyword extraction for URL-list bulk runs, where rows arrive without a
//! keywords column. Ranks words by frequency in the page text; short words
//! and thin pages yield nothing rather than noise.

use std::collections::HashMap;

pub const MAX_AUTO_KEYWORDS: usize = 5;

const MIN_CONTENT_CHARS: usize = 50;
const MIN_WORD_CHARS: usize = 4;

/// Top `max_keywords` words of the text by frequency, ties broken by first
/// occurrence so the result is deterministic.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    if text.trim().chars().count() < MIN_CONTENT_CHARS {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let mut entries: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, word) in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
        .enumerate()
    {
        let entry = entries.entry(word).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = entries.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    ranked
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word.to_string())
        .collect()
}
