//! Merge AI-curated phrases with lexical fallbacks.

use eventlens_core::{CandidatePhrase, DedupMode, EnhancedPhrase, PipelineConfig};

const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Combines enhancer output with lexical candidates.
///
/// AI phrases are kept first; lexical candidates fill remaining capacity in
/// rank order unless they overlap a phrase already kept. The result is
/// filtered by `min_score`, sorted by descending score and capped at
/// `max_keyphrases`. Pure and deterministic.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    pub max_keyphrases: usize,
    pub min_score: f64,
    pub dedup_mode: DedupMode,
}

impl Reconciler {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_keyphrases: config.max_keyphrases,
            min_score: config.min_score,
            dedup_mode: config.dedup_mode,
        }
    }

    pub fn merge(
        &self,
        candidates: &[CandidatePhrase],
        ai_result: &[EnhancedPhrase],
    ) -> Vec<EnhancedPhrase> {
        let mut merged: Vec<EnhancedPhrase> = ai_result.to_vec();

        for (i, candidate) in candidates.iter().enumerate() {
            if merged.len() >= self.max_keyphrases {
                break;
            }
            if merged
                .iter()
                .any(|kept| overlaps(&kept.phrase, &candidate.phrase, self.dedup_mode))
            {
                continue;
            }
            merged.push(fallback_phrase(candidate, i));
        }

        merged.retain(|p| p.score >= self.min_score);
        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        merged.truncate(self.max_keyphrases);
        merged
    }
}

/// Lexical candidate at position `index` as a fallback phrase.
///
/// Score is `max(0.1, 1.0 - index * 0.1)`, computed in tenths so index 7
/// lands exactly on 0.3 rather than just below it.
fn fallback_phrase(candidate: &CandidatePhrase, index: usize) -> EnhancedPhrase {
    let tenths = 10i64.saturating_sub(index as i64);
    EnhancedPhrase {
        phrase: candidate.phrase.clone(),
        score: (tenths as f64 / 10.0).max(0.1),
        confidence: FALLBACK_CONFIDENCE,
        ai_enhanced: false,
        original_rank: Some(candidate.rank),
    }
}

/// Case-sensitive containment in either direction.
fn overlaps(a: &str, b: &str, mode: DedupMode) -> bool {
    match mode {
        DedupMode::Substring => a.contains(b) || b.contains(a),
        DedupMode::TokenBoundary => contains_on_boundary(a, b) || contains_on_boundary(b, a),
    }
}

/// A match boundary is a non-alphanumeric neighbour or a switch between
/// Latin and Japanese script, so "React" is a token of "Reactを使った".
fn contains_on_boundary(haystack: &str, needle: &str) -> bool {
    let (Some(first), Some(last)) = (needle.chars().next(), needle.chars().next_back()) else {
        return false;
    };
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        is_boundary(before, first) && is_boundary(after, last)
    })
}

fn is_boundary(outside: Option<char>, edge: char) -> bool {
    match outside {
        None => true,
        Some(c) => !c.is_alphanumeric() || is_japanese(c) != is_japanese(edge),
    }
}

fn is_japanese(c: char) -> bool {
    matches!(c,
        '\u{3041}'..='\u{30FF}'
        | '\u{31F0}'..='\u{31FF}'
        | '\u{FF66}'..='\u{FF9F}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{3005}')
}
