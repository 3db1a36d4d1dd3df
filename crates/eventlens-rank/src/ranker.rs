//! LLM-backed relevance ranking.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use eventlens_core::{Error, EventKeyData, RankerConfig, RecommendedEvent, Result};
use eventlens_llm::{complete_with_timeout, parse_json_reply, CompletionRequest, LlmTransport};
use serde::Deserialize;
use tracing::{debug, info};

use crate::types::{QueryRecommendations, TagRecommendations};

const SYSTEM_PROMPT: &str = "You match technical events to a user's interests. \
Reply with a single JSON object and nothing else.";

const NO_EVENTS_MESSAGE: &str = "No events are available for the selected filters.";
const NO_MATCH_MESSAGE: &str = "No events matched this interest.";

/// Phrases and sentences listed per event in the prompt.
const PROMPT_PHRASES: usize = 10;
const PROMPT_SENTENCES: usize = 3;

#[derive(Debug, Deserialize)]
struct RankingReply {
    recommendations: Vec<RankedItem>,
}

#[derive(Debug, Deserialize)]
struct RankedItem {
    index: usize,
    score: f64,
    #[serde(default)]
    reason: String,
}

/// What the events are being ranked against.
#[derive(Debug, Clone, Copy)]
enum Subject<'a> {
    Tag(&'a str),
    Query(&'a str),
}

impl<'a> Subject<'a> {
    fn text(&self) -> &'a str {
        match *self {
            Subject::Tag(s) | Subject::Query(s) => s,
        }
    }
}

/// Scores events against a tag or query through windowed comparison calls.
pub struct RelevanceRanker {
    transport: Arc<dyn LlmTransport>,
    config: RankerConfig,
}

impl RelevanceRanker {
    pub fn new(transport: Arc<dyn LlmTransport>, config: RankerConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Top events for `tag`, best first. Ties keep input order.
    ///
    /// Zero events is an empty list without an external call. Any failed
    /// comparison call is `Error::RankingFailed` naming the tag.
    pub async fn rank(&self, tag: &str, events: &[EventKeyData]) -> Result<Vec<RecommendedEvent>> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::InvalidRequest("tag must not be empty".into()));
        }
        self.rank_subject(Subject::Tag(tag), events).await
    }

    /// One group per tag, in request order. Tags are ranked one at a time.
    pub async fn rank_tags(
        &self,
        tags: &[String],
        events: &[EventKeyData],
    ) -> Result<Vec<TagRecommendations>> {
        let tags: Vec<&str> = tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
        if tags.is_empty() {
            return Err(Error::InvalidRequest("at least one tag is required".into()));
        }

        let mut groups = Vec::with_capacity(tags.len());
        for tag in tags {
            let recommendations = self.rank_subject(Subject::Tag(tag), events).await?;
            let message = empty_message(events, &recommendations);
            groups.push(TagRecommendations {
                tag: tag.to_string(),
                recommendations,
                message,
            });
        }
        Ok(groups)
    }

    /// Rank against a free-text message, or the tags joined when no message is given.
    pub async fn rank_query(
        &self,
        message: Option<&str>,
        tags: &[String],
        events: &[EventKeyData],
    ) -> Result<QueryRecommendations> {
        let query = match message.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => m.to_string(),
            None => tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        };
        if query.is_empty() {
            return Err(Error::InvalidRequest("either a message or tags is required".into()));
        }

        let recommendations = self.rank_subject(Subject::Query(&query), events).await?;
        let message = empty_message(events, &recommendations);
        Ok(QueryRecommendations {
            query,
            recommendations,
            message,
        })
    }

    /// Events are compared in windows of `max_events_per_request`, one call
    /// per window in listing order. Every window must succeed.
    async fn rank_subject(
        &self,
        subject: Subject<'_>,
        events: &[EventKeyData],
    ) -> Result<Vec<RecommendedEvent>> {
        if events.is_empty() {
            debug!("No candidate events for '{}'", subject.text());
            return Ok(Vec::new());
        }

        let window_size = self.config.max_events_per_request.max(1);
        let failed = |reason: String| Error::RankingFailed {
            subject: subject.text().to_string(),
            reason,
        };

        let mut picks = Vec::new();
        for (n, window) in events.chunks(window_size).enumerate() {
            let offset = n * window_size;
            let prompt = self.build_prompt(subject, window);
            let request = CompletionRequest::new(prompt).with_system(SYSTEM_PROMPT);
            let reply = complete_with_timeout(&self.transport, request, self.config.timeout())
                .await
                .map_err(|e| failed(e.to_string()))?;
            let parsed: RankingReply = parse_json_reply(&reply).map_err(|e| failed(e.to_string()))?;

            picks.extend(
                parsed
                    .recommendations
                    .into_iter()
                    .filter(|item| item.index < window.len())
                    .map(|item| RankedItem {
                        index: item.index + offset,
                        ..item
                    }),
            );
        }

        let ranked = select_top(picks, events, self.config.top_n);
        info!(
            "Ranked {} events for '{}' in {} call(s), returning {}",
            events.len(),
            subject.text(),
            events.len().div_ceil(window_size),
            ranked.len()
        );
        Ok(ranked)
    }

    fn build_prompt(&self, subject: Subject<'_>, events: &[EventKeyData]) -> String {
        let interest = match subject {
            Subject::Tag(tag) => format!("USER INTEREST TAG: {}", tag),
            Subject::Query(query) => format!("USER REQUEST: {}", query),
        };

        let listing: Vec<String> = events
            .iter()
            .enumerate()
            .map(|(i, event)| {
                let phrases: Vec<&str> =
                    event.phrase_texts().into_iter().take(PROMPT_PHRASES).collect();
                let sentences: Vec<&str> = event
                    .key_sentences
                    .iter()
                    .take(PROMPT_SENTENCES)
                    .map(String::as_str)
                    .collect();
                format!(
                    "[{}] {}\n  keyphrases: {}\n  key sentences: {}",
                    i,
                    event.title,
                    phrases.join(", "),
                    sentences.join(" / ")
                )
            })
            .collect();

        format!(
            r#"{interest}

CANDIDATE EVENTS:
{listing}

Judge how well each event matches the user's interest using its keyphrases and key sentences.
Return the {top_n} most relevant events by their index. Score each from 0.0 to 1.0 and give a
one-sentence reason naming the phrases or sentences that drove the match. Leave out events that
do not match at all.

Return JSON:
{{
    "recommendations": [
        {{ "index": 0, "score": 0.9, "reason": "why it matches" }}
    ]
}}"#,
            interest = interest,
            listing = listing.join("\n"),
            top_n = self.config.top_n,
        )
    }
}

/// Validate, order and cap the model's picks.
///
/// Out-of-range and repeated indices are dropped. Scores are clamped to
/// `[0, 1]`. Equal scores keep the earlier event first.
fn select_top(
    items: Vec<RankedItem>,
    events: &[EventKeyData],
    top_n: usize,
) -> Vec<RecommendedEvent> {
    let mut seen = HashSet::new();
    let mut picks: Vec<(usize, f64, String)> = items
        .into_iter()
        .filter(|item| item.index < events.len() && seen.insert(item.index))
        .map(|item| {
            let score = if item.score.is_finite() { item.score.clamp(0.0, 1.0) } else { 0.0 };
            (item.index, score, item.reason.trim().to_string())
        })
        .collect();

    picks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    picks.truncate(top_n);

    picks
        .into_iter()
        .map(|(index, score, reason)| {
            let event = &events[index];
            RecommendedEvent {
                id: event.id.clone(),
                title: event.title.clone(),
                relevance_score: score,
                relevance_reason: reason,
            }
        })
        .collect()
}

fn empty_message(events: &[EventKeyData], recommendations: &[RecommendedEvent]) -> Option<String> {
    if events.is_empty() {
        Some(NO_EVENTS_MESSAGE.to_string())
    } else if recommendations.is_empty() {
        Some(NO_MATCH_MESSAGE.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventlens_core::EnhancedPhrase;
    use futures::future::BoxFuture;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Replies with a fixed body, or fails when `reply` is `None`.
    struct FixedTransport {
        reply: Option<String>,
        delay: Duration,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedTransport {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().len()
        }
    }

    impl LlmTransport for FixedTransport {
        fn complete(&self, request: CompletionRequest) -> BoxFuture<'static, Result<String>> {
            self.prompts.lock().push(request.prompt);
            let reply = self.reply.clone();
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                reply.ok_or_else(|| Error::Llm("connection refused".into()))
            })
        }
    }

    /// Replies based on the prompt it receives.
    struct PromptTransport {
        respond: fn(&str) -> Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl PromptTransport {
        fn new(respond: fn(&str) -> Option<String>) -> Arc<Self> {
            Arc::new(Self {
                respond,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl LlmTransport for PromptTransport {
        fn complete(&self, request: CompletionRequest) -> BoxFuture<'static, Result<String>> {
            let reply = (self.respond)(&request.prompt);
            self.prompts.lock().push(request.prompt);
            Box::pin(async move { reply.ok_or_else(|| Error::Llm("bad gateway".into())) })
        }
    }

    fn event(id: &str, title: &str, phrases: &[&str]) -> EventKeyData {
        EventKeyData {
            id: id.into(),
            title: title.into(),
            detail: String::new(),
            key_phrases: phrases
                .iter()
                .map(|p| EnhancedPhrase {
                    phrase: p.to_string(),
                    score: 0.9,
                    confidence: 0.9,
                    ai_enhanced: true,
                    original_rank: None,
                })
                .collect(),
            key_sentences: vec![format!("{} for engineers.", title)],
        }
    }

    fn events() -> Vec<EventKeyData> {
        vec![
            event("e0", "Rust Tokyo", &["Rust", "async"]),
            event("e1", "Go Conference", &["Go", "gRPC"]),
            event("e2", "Rust Embedded Night", &["Rust", "embedded"]),
            event("e3", "Design Systems Meetup", &["Figma", "design tokens"]),
        ]
    }

    fn ranker(transport: Arc<FixedTransport>) -> RelevanceRanker {
        RelevanceRanker::new(transport, RankerConfig::default())
    }

    #[tokio::test]
    async fn test_orders_by_score_and_caps_top_n() {
        let transport = FixedTransport::replying(
            r#"{"recommendations": [
                {"index": 3, "score": 0.1, "reason": "unrelated"},
                {"index": 2, "score": 0.8, "reason": "Rust embedded"},
                {"index": 0, "score": 0.95, "reason": "Rust and async"},
                {"index": 1, "score": 0.3, "reason": "systems language"}
            ]}"#,
        );
        let results = ranker(transport.clone()).rank("rust", &events()).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["e0", "e2", "e1"]);
        assert_eq!(results[0].relevance_reason, "Rust and async");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_ties_prefer_earlier_event() {
        let transport = FixedTransport::replying(
            r#"{"recommendations": [
                {"index": 2, "score": 0.8, "reason": "b"},
                {"index": 0, "score": 0.8, "reason": "a"}
            ]}"#,
        );
        let results = ranker(transport).rank("rust", &events()).await.unwrap();
        assert_eq!(results[0].id, "e0");
        assert_eq!(results[1].id, "e2");
    }

    #[tokio::test]
    async fn test_invalid_and_duplicate_indices_dropped() {
        let transport = FixedTransport::replying(
            r#"Sure! {"recommendations": [
                {"index": 9, "score": 0.99, "reason": "hallucinated"},
                {"index": 1, "score": 1.4, "reason": "first"},
                {"index": 1, "score": 0.2, "reason": "repeat"}
            ]}"#,
        );
        let results = ranker(transport).rank("go", &events()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "e1");
        assert_eq!(results[0].relevance_score, 1.0);
    }

    #[tokio::test]
    async fn test_zero_events_is_empty_without_call() {
        let transport = FixedTransport::failing();
        let groups = ranker(transport.clone())
            .rank_tags(&["rust".to_string()], &[])
            .await
            .unwrap();
        assert!(groups[0].recommendations.is_empty());
        assert_eq!(groups[0].message.as_deref(), Some(NO_EVENTS_MESSAGE));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_names_tag() {
        let err = ranker(FixedTransport::failing()).rank("rust", &events()).await.unwrap_err();
        match err {
            Error::RankingFailed { subject, .. } => assert_eq!(subject, "rust"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_reply_is_ranking_failure() {
        let transport = FixedTransport::replying("I think the first one is best.");
        let err = ranker(transport).rank("rust", &events()).await.unwrap_err();
        assert!(matches!(err, Error::RankingFailed { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_ranking_failure() {
        let transport = Arc::new(FixedTransport {
            reply: Some(r#"{"recommendations": []}"#.into()),
            delay: Duration::from_millis(200),
            prompts: Mutex::new(Vec::new()),
        });
        let config = RankerConfig {
            timeout_ms: 10,
            ..Default::default()
        };
        let err = RelevanceRanker::new(transport, config)
            .rank("rust", &events())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Timed out"));
    }

    #[tokio::test]
    async fn test_rank_tags_keeps_grouping() {
        let transport = FixedTransport::replying(
            r#"{"recommendations": [{"index": 0, "score": 0.7, "reason": "ok"}]}"#,
        );
        let tags = vec!["rust".to_string(), "  ".to_string(), "async".to_string()];
        let groups = ranker(transport.clone()).rank_tags(&tags, &events()).await.unwrap();

        let names: Vec<&str> = groups.iter().map(|g| g.tag.as_str()).collect();
        assert_eq!(names, vec!["rust", "async"]);
        assert_eq!(transport.calls(), 2);
        assert!(groups.iter().all(|g| g.message.is_none()));
    }

    #[tokio::test]
    async fn test_query_requires_message_or_tags() {
        let transport = FixedTransport::failing();
        let err = ranker(transport.clone()).rank_query(None, &[], &events()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_falls_back_to_tags() {
        let transport = FixedTransport::replying(r#"{"recommendations": []}"#);
        let result = ranker(transport.clone())
            .rank_query(Some("  "), &["rust".to_string(), "embedded".to_string()], &events())
            .await
            .unwrap();
        assert_eq!(result.query, "rust, embedded");
        assert_eq!(result.message.as_deref(), Some(NO_MATCH_MESSAGE));
        assert!(transport.prompts.lock()[0].contains("USER REQUEST: rust, embedded"));
    }

    #[tokio::test]
    async fn test_prompt_lists_phrases_and_sentences() {
        let transport = FixedTransport::replying(r#"{"recommendations": []}"#);
        ranker(transport.clone()).rank("design", &events()).await.unwrap();
        let prompt = transport.prompts.lock()[0].clone();
        assert!(prompt.contains("[3] Design Systems Meetup"));
        assert!(prompt.contains("Figma, design tokens"));
        assert!(prompt.contains("Design Systems Meetup for engineers."));
    }

    fn cooking_then(extra: &[(&str, &str)]) -> Vec<EventKeyData> {
        let mut events: Vec<EventKeyData> = (0..50)
            .map(|i| event(&format!("c{}", i), "Cooking class", &["cooking"]))
            .collect();
        events.extend(extra.iter().map(|(id, title)| event(id, title, &["Rust"])));
        events
    }

    #[tokio::test]
    async fn test_events_past_first_window_are_ranked() {
        let transport = PromptTransport::new(|prompt| {
            let body = if prompt.contains("[0] Rust Meetup") {
                r#"{"recommendations": [{"index": 0, "score": 0.9, "reason": "Rust"}]}"#
            } else {
                r#"{"recommendations": []}"#
            };
            Some(body.to_string())
        });
        let events = cooking_then(&[("rust-50", "Rust Meetup")]);

        let results = RelevanceRanker::new(transport.clone(), RankerConfig::default())
            .rank("rust", &events)
            .await
            .unwrap();

        assert_eq!(transport.prompts.lock().len(), 2);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "rust-50");
    }

    #[tokio::test]
    async fn test_windows_merge_by_score_then_listing_order() {
        let config = RankerConfig {
            max_events_per_request: 2,
            ..Default::default()
        };
        // Every window picks its second event at 0.5 and its first at 0.8 when titled Rust.
        let transport = PromptTransport::new(|prompt| {
            let first = if prompt.contains("[0] Rust") { 0.8 } else { 0.2 };
            Some(format!(
                r#"{{"recommendations": [
                    {{"index": 1, "score": 0.5, "reason": "second"}},
                    {{"index": 0, "score": {}, "reason": "first"}},
                    {{"index": 7, "score": 1.0, "reason": "out of window"}}
                ]}}"#,
                first
            ))
        });

        let results = RelevanceRanker::new(transport.clone(), config)
            .rank("rust", &events())
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["e0", "e2", "e1"]);
        assert_eq!(results[1].relevance_score, 0.8);
        assert_eq!(transport.prompts.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_in_later_window_fails_ranking() {
        let transport = PromptTransport::new(|prompt| {
            if prompt.contains("Rust Meetup") {
                None
            } else {
                Some(r#"{"recommendations": [{"index": 0, "score": 0.4, "reason": "x"}]}"#.into())
            }
        });
        let events = cooking_then(&[("rust-50", "Rust Meetup")]);

        let err = RelevanceRanker::new(transport, RankerConfig::default())
            .rank("rust", &events)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RankingFailed { ref subject, .. } if subject == "rust"));
    }
}
