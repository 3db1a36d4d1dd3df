//! Semantic enhancement of lexical candidates via an external language model.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use eventlens_core::{CandidatePhrase, EnhancedPhrase, PipelineConfig, Result};
use eventlens_llm::{complete_with_timeout, parse_json_reply, CompletionRequest, LlmTransport};
use serde::Deserialize;
use tracing::{debug, info};

use crate::retry::{RetriesExhausted, RetryPolicy};

const SYSTEM_PROMPT: &str = "You curate keyphrases for technical event listings. \
Reply with a single JSON object and nothing else.";

#[derive(Debug, Deserialize)]
struct EnhancementReply {
    enhanced_keyphrases: Vec<AiKeyphrase>,
}

#[derive(Debug, Deserialize)]
struct AiKeyphrase {
    phrase: String,
    score: f64,
    #[serde(default)]
    #[allow(dead_code)]
    reason: String,
}

/// Asks a language model to curate, deduplicate and re-score candidates.
pub struct SemanticEnhancer {
    transport: Arc<dyn LlmTransport>,
    retry: RetryPolicy,
    timeout: Duration,
    max_ai_keyphrases: usize,
    max_keyphrases: usize,
    text_prefix_chars: usize,
}

impl SemanticEnhancer {
    pub fn new(transport: Arc<dyn LlmTransport>, config: &PipelineConfig) -> Self {
        Self {
            transport,
            retry: RetryPolicy::from_config(config),
            timeout: config.timeout(),
            max_ai_keyphrases: config.max_ai_keyphrases,
            max_keyphrases: config.max_keyphrases,
            text_prefix_chars: config.text_prefix_chars,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_available(&self) -> bool {
        self.transport.is_available()
    }

    /// Curated phrases sorted by descending score, at most `max_keyphrases`.
    ///
    /// A timeout, transport error or malformed reply consumes one attempt.
    /// `Err` means no AI phrases are available for this text.
    pub async fn enhance(
        &self,
        raw_text: &str,
        candidates: &[CandidatePhrase],
    ) -> std::result::Result<Vec<EnhancedPhrase>, RetriesExhausted> {
        let prompt = self.build_prompt(raw_text, candidates);
        debug!(
            "Enhancement prompt: {} chars, {} candidates",
            prompt.chars().count(),
            candidates.len()
        );

        let phrases = self
            .retry
            .run("keyphrase enhancement", |_| self.attempt(prompt.clone()))
            .await?;

        info!("Enhancer returned {} keyphrases", phrases.len());
        Ok(phrases)
    }

    async fn attempt(&self, prompt: String) -> Result<Vec<EnhancedPhrase>> {
        let request = CompletionRequest::new(prompt).with_system(SYSTEM_PROMPT);
        let reply = complete_with_timeout(&self.transport, request, self.timeout).await?;
        parse_enhancement(&reply, self.max_keyphrases)
    }

    fn build_prompt(&self, raw_text: &str, candidates: &[CandidatePhrase]) -> String {
        let text: String = raw_text.chars().take(self.text_prefix_chars).collect();
        let listed: Vec<&str> = candidates.iter().map(|c| c.phrase.as_str()).collect();

        format!(
            r#"Below is the description of a technical event and keyphrases extracted from it
automatically.

EVENT TEXT:
{text}

EXTRACTED KEYPHRASES:
{candidates}

Select the phrases that best describe what the event is about: technologies, topics, and formats.
Merge duplicates and near-duplicates, drop generic words, and add a missing phrase only if it
clearly appears in the text. Keep phrases in the language they appear in. Return at most {max}
phrases.

Score each phrase from 0.0 to 1.0 by how central it is to the event, and give a short reason.

Return JSON:
{{
    "enhanced_keyphrases": [
        {{ "phrase": "phrase text", "score": 0.9, "reason": "why it matters" }}
    ]
}}"#,
            text = text,
            candidates = serde_json::to_string(&listed).unwrap_or_else(|_| "[]".into()),
            max = self.max_ai_keyphrases,
        )
    }
}

/// Decode a model reply into enhanced phrases.
///
/// Empty phrases and case-insensitive repeats are dropped; scores are
/// clamped to `[0, 1]` and confidence to `[0.1, 1.0]`.
pub fn parse_enhancement(reply: &str, max_keyphrases: usize) -> Result<Vec<EnhancedPhrase>> {
    let parsed: EnhancementReply = parse_json_reply(reply)?;

    let mut seen = HashSet::new();
    let mut phrases: Vec<EnhancedPhrase> = parsed
        .enhanced_keyphrases
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let phrase = item.phrase.trim().to_string();
            if phrase.is_empty() || !seen.insert(phrase.to_lowercase()) {
                return None;
            }
            let score = if item.score.is_finite() { item.score.clamp(0.0, 1.0) } else { 0.0 };
            Some(EnhancedPhrase {
                phrase,
                score,
                confidence: score.clamp(0.1, 1.0),
                ai_enhanced: true,
                original_rank: Some(position),
            })
        })
        .collect();

    phrases.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    phrases.truncate(max_keyphrases);
    Ok(phrases)
}
