//! Key sentence selection for event descriptions.
//!
//! Scores sentences by position, length, indicator words and density of
//! technical terms, then returns the best ones in document order.

use once_cell::sync::Lazy;
use regex::Regex;

const MIN_SENTENCE_CHARS: usize = 8;
const FALLBACK_CHARS: usize = 500;

static TECH_TERM: Lazy<Regex> = Lazy::new(|| {
    // camelCase, snake_case, dotted names (Next.js), trailing +/# (C++, C#)
    Regex::new(concat!(
        r"\b[a-z]+[A-Z][A-Za-z]*\b|\b[a-z]+_[a-z]+\b|",
        r"\b[A-Za-z]+\.[a-z]{1,4}\b|\b[A-Za-z]+(\+\+|#)",
    ))
    .expect("valid regex")
});

const INDICATORS: &[&str] = &[
    "learn", "hands-on", "workshop", "introduce", "introduction", "beginner", "speaker",
    "talk", "session", "demo", "deep dive", "best practice", "you will",
    "学", "解説", "紹介", "ハンズオン", "初心者", "登壇", "入門", "実践",
];

/// Split on `. ! ?` followed by whitespace, and on full-width `。！？` and newlines.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        let next_is_space = iter.peek().map(|(_, n)| n.is_whitespace()).unwrap_or(true);
        let boundary = match c {
            '.' | '!' | '?' => next_is_space,
            '。' | '！' | '？' | '\n' => true,
            _ => false,
        };
        if boundary {
            let end = i + c.len_utf8();
            let s = text[start..end].trim();
            if !s.is_empty() {
                sentences.push(s);
            }
            start = end;
        }
    }
    let s = text[start..].trim();
    if !s.is_empty() {
        sentences.push(s);
    }
    sentences
}

fn score_sentence(sent: &str, index: usize, total: usize) -> i32 {
    let mut score = 0i32;

    if index < 3 {
        score += (3 - index) as i32;
    }
    if total > 5 && index >= total.saturating_sub(2) {
        score += 1;
    }

    let len = sent.chars().count();
    if (25..200).contains(&len) {
        score += 2;
    } else if len >= 200 {
        score += 1;
    }

    let lower = sent.to_lowercase();
    let hits = INDICATORS.iter().filter(|kw| lower.contains(**kw)).count();
    score += (hits * 2) as i32;

    let capitalized = sent
        .split_whitespace()
        .skip(1)
        .filter(|w| {
            w.chars().next().is_some_and(|c| c.is_uppercase())
                && !w.chars().all(|c| !c.is_lowercase())
        })
        .count();
    score += capitalized.min(3) as i32;

    score += TECH_TERM.find_iter(sent).count().min(2) as i32;

    score
}

/// Pick up to `max_sentences` key sentences, returned in document order.
pub fn extract_key_sentences(text: &str, max_sentences: usize) -> Vec<String> {
    if text.trim().is_empty() || max_sentences == 0 {
        return Vec::new();
    }

    let sentences: Vec<&str> = split_sentences(text)
        .into_iter()
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .collect();

    if sentences.is_empty() {
        let truncated: String = text.trim().chars().take(FALLBACK_CHARS).collect();
        return vec![truncated];
    }

    let total = sentences.len();
    let mut scored: Vec<(i32, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| (score_sentence(s, i, total), i))
        .collect();

    // Stable: equal scores keep document order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    let mut picked: Vec<usize> = scored.into_iter().take(max_sentences).map(|(_, i)| i).collect();
    picked.sort_unstable();

    picked.into_iter().map(|i| sentences[i].to_string()).collect()
}
