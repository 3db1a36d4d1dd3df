//! Shared data model for extraction and ranking.

use serde::{Deserialize, Serialize};

/// Source text for an event (title + description). Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A phrase proposed by the lexical extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePhrase {
    pub phrase: String,
    /// Relative importance; range depends on the ranking algorithm.
    pub score: f64,
    /// 0-based position in the extractor's output ordering.
    pub rank: usize,
}

/// A phrase after reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedPhrase {
    pub phrase: String,
    /// In `[0, 1]`.
    pub score: f64,
    /// In `[0.1, 1.0]`.
    pub confidence: f64,
    /// `true` when the phrase came from the semantic enhancer.
    pub ai_enhanced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_rank: Option<usize>,
}

/// Per-event projection consumed by the relevance ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventKeyData {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub key_phrases: Vec<EnhancedPhrase>,
    pub key_sentences: Vec<String>,
}

impl EventKeyData {
    /// Phrase strings only, in stored order.
    pub fn phrase_texts(&self) -> Vec<&str> {
        self.key_phrases.iter().map(|p| p.phrase.as_str()).collect()
    }
}

/// Ranker output for one (tag, event) pair. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedEvent {
    pub id: String,
    pub title: String,
    pub relevance_score: f64,
    pub relevance_reason: String,
}
