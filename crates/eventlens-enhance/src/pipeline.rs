//! Extraction pipeline: text, lexical candidates, cached enhancement, reconcile.

use std::sync::Arc;
use std::time::Duration;

use eventlens_cache::{fingerprint, KeyphraseCache};
use eventlens_core::{EnhancedPhrase, EventKeyData, PipelineConfig, RawDocument};
use eventlens_extract::{extract_key_sentences, LexicalExtractor};
use eventlens_llm::LlmTransport;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::enhancer::SemanticEnhancer;
use crate::reconcile::Reconciler;
use crate::retry::RetryPolicy;

const KEY_SENTENCES: usize = 3;

/// Where a keyphrase set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PhraseSource {
    Cached,
    Enhanced,
    /// Enhancement failed or was skipped; lexical fallbacks only.
    LexicalOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    pub keyphrases: Vec<EnhancedPhrase>,
    pub source: PhraseSource,
}

/// Runs extraction for one document at a time. Never fails.
pub struct KeyphrasePipeline {
    extractor: LexicalExtractor,
    enhancer: SemanticEnhancer,
    reconciler: Reconciler,
    cache: Arc<dyn KeyphraseCache>,
    config: PipelineConfig,
}

impl KeyphrasePipeline {
    pub fn new(
        transport: Arc<dyn LlmTransport>,
        cache: Arc<dyn KeyphraseCache>,
        config: PipelineConfig,
    ) -> Self {
        info!(
            "Keyphrase pipeline: max_retries={}, timeout={}ms, max_keyphrases={}, cache={}",
            config.max_retries, config.timeout_ms, config.max_keyphrases, config.cache_enabled
        );
        Self {
            extractor: LexicalExtractor::new(config.lexical_candidates),
            enhancer: SemanticEnhancer::new(transport, &config),
            reconciler: Reconciler::from_config(&config),
            cache,
            config,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.enhancer = self.enhancer.with_retry_policy(policy);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn KeyphraseCache> {
        &self.cache
    }

    pub fn enhancer_available(&self) -> bool {
        self.enhancer.is_available()
    }

    /// Final keyphrase set for `text`.
    pub async fn extract(&self, text: &str) -> ExtractionOutcome {
        if text.trim().is_empty() {
            return ExtractionOutcome {
                keyphrases: Vec::new(),
                source: PhraseSource::LexicalOnly,
            };
        }

        let key = fingerprint(text, self.config.fingerprint_prefix_chars);
        if self.config.cache_enabled {
            if let Some(hit) = self.cache.get(&key) {
                debug!("Keyphrase cache hit {}", key);
                return ExtractionOutcome {
                    keyphrases: hit,
                    source: PhraseSource::Cached,
                };
            }
        }

        let candidates = self.extractor.extract(text);

        let (ai_result, source) = if !self.enhancer.is_available() {
            (Vec::new(), PhraseSource::LexicalOnly)
        } else {
            match self.enhancer.enhance(text, &candidates).await {
                Ok(phrases) => (phrases, PhraseSource::Enhanced),
                Err(e) => {
                    warn!("Enhancement unavailable, using lexical keyphrases: {}", e);
                    (Vec::new(), PhraseSource::LexicalOnly)
                }
            }
        };

        let keyphrases = self.reconciler.merge(&candidates, &ai_result);

        if self.config.cache_enabled && source == PhraseSource::Enhanced {
            self.cache.put(key, keyphrases.clone(), self.config.cache_ttl());
        }

        ExtractionOutcome { keyphrases, source }
    }

    /// Extract for a stored document, logging by id.
    pub async fn extract_document(&self, doc: &RawDocument) -> ExtractionOutcome {
        let outcome = self.extract(&doc.text).await;
        info!(
            "Extracted {} keyphrases for {} ({:?})",
            outcome.keyphrases.len(),
            doc.id,
            outcome.source
        );
        outcome
    }

    /// Build the ranker's projection of one event.
    pub async fn build_event_key_data(&self, id: &str, title: &str, detail: &str) -> EventKeyData {
        let doc = RawDocument::new(id, format!("{}\n{}", title, detail));
        let outcome = self.extract_document(&doc).await;
        let key_sentences = extract_key_sentences(detail, KEY_SENTENCES);

        EventKeyData {
            id: id.to_string(),
            title: title.to_string(),
            detail: detail.to_string(),
            key_phrases: outcome.keyphrases,
            key_sentences,
        }
    }

    /// Sequential bulk extraction with `delay` between documents.
    pub async fn extract_batch(
        &self,
        docs: &[RawDocument],
        delay: Duration,
    ) -> Vec<(String, ExtractionOutcome)> {
        let mut results = Vec::with_capacity(docs.len());
        for (i, doc) in docs.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let outcome = self.extract_document(doc).await;
            results.push((doc.id.clone(), outcome));
        }
        info!("Batch extraction complete: {} documents", results.len());
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{enhancement_reply, ScriptedTransport, Step};
    use eventlens_cache::InMemoryKeyphraseCache;

    const FRONTEND: &str = "React/Next.jsを使ったフロントエンド勉強会";

    fn config() -> PipelineConfig {
        PipelineConfig {
            timeout_ms: 50,
            backoff_base_ms: 0,
            ..Default::default()
        }
    }

    fn pipeline(
        steps: Vec<Step>,
        config: PipelineConfig,
    ) -> (KeyphrasePipeline, Arc<ScriptedTransport>) {
        let transport = ScriptedTransport::new(steps);
        let cache = Arc::new(InMemoryKeyphraseCache::default());
        (KeyphrasePipeline::new(transport.clone(), cache, config), transport)
    }

    #[tokio::test]
    async fn test_enhanced_then_cached() {
        let (p, transport) = pipeline(
            vec![Step::Reply(enhancement_reply(&[("Next.js", 0.9), ("React", 0.85)]))],
            config(),
        );

        let first = p.extract(FRONTEND).await;
        assert_eq!(first.source, PhraseSource::Enhanced);
        let ai: Vec<&str> = first
            .keyphrases
            .iter()
            .filter(|k| k.ai_enhanced)
            .map(|k| k.phrase.as_str())
            .collect();
        assert_eq!(ai, vec!["Next.js", "React"]);
        assert!(first
            .keyphrases
            .iter()
            .any(|k| k.phrase == "フロントエンド勉強会" && !k.ai_enhanced));

        let second = p.extract(FRONTEND).await;
        assert_eq!(second.source, PhraseSource::Cached);
        assert_eq!(second.keyphrases, first.keyphrases);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_retries_fail_falls_back_to_lexical() {
        let (p, transport) = pipeline(vec![Step::Fail], config());

        let outcome = p.extract(FRONTEND).await;
        assert_eq!(outcome.source, PhraseSource::LexicalOnly);
        assert!(!outcome.keyphrases.is_empty());
        assert!(outcome.keyphrases.iter().all(|k| !k.ai_enhanced));
        assert_eq!(transport.calls(), 3);
        // Degraded results are not cached.
        assert!(p.cache().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_skips_everything() {
        let (p, transport) = pipeline(vec![Step::Fail], config());
        let outcome = p.extract("   ").await;
        assert!(outcome.keyphrases.is_empty());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let reply = enhancement_reply(&[("Rust", 0.9)]);
        let (p, transport) = pipeline(
            vec![Step::Reply(reply)],
            PipelineConfig {
                cache_enabled: false,
                ..config()
            },
        );
        p.extract("Rust meetup").await;
        let again = p.extract("Rust meetup").await;
        assert_eq!(again.source, PhraseSource::Enhanced);
        assert_eq!(transport.calls(), 2);
        assert!(p.cache().is_empty());
    }

    #[tokio::test]
    async fn test_build_event_key_data() {
        let reply = enhancement_reply(&[("Rust", 0.95), ("axum", 0.8)]);
        let (p, _) = pipeline(vec![Step::Reply(reply)], config());
        let data = p
            .build_event_key_data(
                "evt-1",
                "Rust Web Night",
                "In this hands-on workshop you will build an API with axum. Pizza provided.",
            )
            .await;
        assert_eq!(data.id, "evt-1");
        assert!(data.key_phrases.iter().any(|k| k.phrase == "Rust" && k.ai_enhanced));
        assert!(!data.key_sentences.is_empty());
        assert!(data.key_phrases.len() <= 10);
    }

    #[tokio::test]
    async fn test_batch_sequential_in_order() {
        let reply = enhancement_reply(&[("Go", 0.9)]);
        let (p, transport) = pipeline(vec![Step::Reply(reply)], config());
        let docs = vec![
            RawDocument::new("a", "Go concurrency patterns"),
            RawDocument::new("b", "Go generics deep dive"),
        ];
        let results = p.extract_batch(&docs, Duration::from_millis(5)).await;
        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(transport.calls(), 2);
    }
}
