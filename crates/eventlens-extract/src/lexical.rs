//! TextRank-style candidate phrase extraction.
//!
//! Content tokens form a co-occurrence graph ranked by PageRank. Maximal
//! runs of adjacent content tokens become candidate phrases scored by the
//! sum of their token ranks. Ties keep first-occurrence order.

pub mod textrank;
pub mod tokenizer;

use std::collections::HashMap;

use eventlens_core::CandidatePhrase;
use tracing::debug;

use textrank::CooccurrenceGraph;
use tokenizer::{tokenize, Token, TokenKind};

/// Longest phrase, in tokens. Longer runs are split.
const MAX_PHRASE_TOKENS: usize = 3;

/// Lexical extractor settings.
#[derive(Debug, Clone, Copy)]
pub struct LexicalExtractor {
    /// Co-occurrence window over content tokens.
    pub window: usize,
    /// Maximum candidates returned.
    pub max_candidates: usize,
}

impl Default for LexicalExtractor {
    fn default() -> Self {
        Self {
            window: 3,
            max_candidates: 20,
        }
    }
}

impl LexicalExtractor {
    pub fn new(max_candidates: usize) -> Self {
        Self {
            max_candidates,
            ..Self::default()
        }
    }

    /// Rank candidate phrases for `text`, most important first.
    pub fn extract(&self, text: &str) -> Vec<CandidatePhrase> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let tokens = tokenize(text);
        let graph = CooccurrenceGraph::build(&tokens, self.window);
        let ranks = graph.rank();

        // (phrase, score, first position), deduplicated case-insensitively.
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut phrases: Vec<(String, f64, usize)> = Vec::new();

        for (position, run) in phrase_runs(&tokens).into_iter().enumerate() {
            let surface = join_surface(&run);
            if surface.chars().count() < 2 {
                continue;
            }
            let key = surface.to_lowercase();
            if seen.contains_key(&key) {
                continue;
            }
            let score: f64 = run.iter().map(|t| ranks.get(&t.norm).copied().unwrap_or(0.0)).sum();
            seen.insert(key, phrases.len());
            phrases.push((surface, score, position));
        }

        phrases.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.2.cmp(&b.2))
        });

        let candidates: Vec<CandidatePhrase> = phrases
            .into_iter()
            .take(self.max_candidates)
            .enumerate()
            .map(|(rank, (phrase, score, _))| CandidatePhrase { phrase, score, rank })
            .collect();

        debug!(
            "Lexical extraction: {} graph nodes, {} candidates",
            graph.node_count(),
            candidates.len()
        );

        candidates
    }
}

/// Convenience wrapper with default window.
pub fn extract_candidates(text: &str, max_candidates: usize) -> Vec<CandidatePhrase> {
    LexicalExtractor::new(max_candidates).extract(text)
}

/// Maximal runs of adjacent content tokens, split at `MAX_PHRASE_TOKENS`.
fn phrase_runs(tokens: &[Token]) -> Vec<Vec<&Token>> {
    let mut runs = Vec::new();
    let mut current: Vec<&Token> = Vec::new();

    for token in tokens {
        if token.kind == TokenKind::Content {
            current.push(token);
            if current.len() == MAX_PHRASE_TOKENS {
                runs.push(std::mem::take(&mut current));
            }
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn join_surface(run: &[&Token]) -> String {
    let mut out = String::new();
    for (i, token) in run.iter().enumerate() {
        if i > 0 && token.space_before {
            out.push(' ');
        }
        out.push_str(&token.surface);
    }
    out
}
