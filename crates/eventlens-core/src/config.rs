//! Pipeline, ranker and server configuration.
//!
//! Every component receives its configuration explicitly. Defaults live in
//! the `Default` impls below; a JSON file and a handful of environment
//! variables can override them at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Ten years.
const MAX_CACHE_TTL_HOURS: u64 = 24 * 365 * 10;

/// How the reconciler decides that a fallback phrase overlaps a kept phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DedupMode {
    /// Case-sensitive substring containment in either direction.
    #[default]
    Substring,
    /// Containment must start and end on token boundaries ("Go" does not match "Good").
    /// A switch between Latin and Japanese script counts as a boundary.
    TokenBoundary,
}

/// Keyphrase extraction pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Total enhancer attempts, including the first.
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub max_keyphrases: usize,
    pub min_score: f64,
    pub cache_enabled: bool,
    pub cache_ttl_hours: u64,
    pub cache_max_entries: usize,
    /// Cap requested from the language model.
    pub max_ai_keyphrases: usize,
    /// Characters of raw text sent to the language model.
    pub text_prefix_chars: usize,
    /// Characters of raw text hashed into the cache key.
    pub fingerprint_prefix_chars: usize,
    /// Candidates produced by the lexical extractor.
    pub lexical_candidates: usize,
    /// Backoff after failed attempt `n` is `backoff_base_ms * 2^n`.
    pub backoff_base_ms: u64,
    pub dedup_mode: DedupMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout_ms: 8000,
            max_keyphrases: 10,
            min_score: 0.3,
            cache_enabled: true,
            cache_ttl_hours: 24,
            cache_max_entries: 1000,
            max_ai_keyphrases: 8,
            text_prefix_chars: 2000,
            fingerprint_prefix_chars: 100,
            lexical_candidates: 20,
            backoff_base_ms: 1000,
            dedup_mode: DedupMode::Substring,
        }
    }
}

impl PipelineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.saturating_mul(3600))
    }

    /// Reject values the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::Config("maxRetries must be at least 1".into()));
        }
        if self.max_keyphrases == 0 {
            return Err(Error::Config("maxKeyphrases must be at least 1".into()));
        }
        if self.cache_ttl_hours > MAX_CACHE_TTL_HOURS {
            return Err(Error::Config(format!(
                "cacheTtlHours must be at most {}, got {}",
                MAX_CACHE_TTL_HOURS, self.cache_ttl_hours
            )));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(Error::Config(format!(
                "minScore must be within [0, 1], got {}",
                self.min_score
            )));
        }
        Ok(())
    }
}

/// Relevance ranker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankerConfig {
    /// Results returned per tag or query.
    pub top_n: usize,
    pub timeout_ms: u64,
    /// Candidate events embedded in one comparison prompt.
    pub max_events_per_request: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            timeout_ms: 8000,
            max_events_per_request: 50,
        }
    }
}

impl RankerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject values that would make every ranking come back empty.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::Config("topN must be at least 1".into()));
        }
        if self.max_events_per_request == 0 {
            return Err(Error::Config("maxEventsPerRequest must be at least 1".into()));
        }
        Ok(())
    }
}

/// Optional JSON config file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    pipeline: PipelineConfig,
    ranker: RankerConfig,
}

/// Top-level EventLens configuration.
#[derive(Debug, Clone)]
pub struct EventLensConfig {
    /// HTTP server port.
    pub port: u16,
    pub pipeline: PipelineConfig,
    pub ranker: RankerConfig,
    /// Delay between documents in bulk extraction.
    pub batch_delay: Duration,
    /// LLM provider configuration (`llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl EventLensConfig {
    /// Create configuration from environment, optional config file, and defaults.
    pub fn from_env() -> Result<Self> {
        let port = env_parse("PORT").unwrap_or(3004);

        let ConfigFile {
            mut pipeline,
            ranker,
        } = match std::env::var("EVENTLENS_CONFIG") {
            Ok(path) => Self::load_file(Path::new(&path))?,
            Err(_) => ConfigFile::default(),
        };

        if let Some(v) = env_parse("EVENTLENS_MAX_RETRIES") {
            pipeline.max_retries = v;
        }
        if let Some(v) = env_parse("EVENTLENS_TIMEOUT_MS") {
            pipeline.timeout_ms = v;
        }
        if let Some(v) = env_parse("EVENTLENS_CACHE_ENABLED") {
            pipeline.cache_enabled = v;
        }
        if let Some(v) = env_parse("EVENTLENS_CACHE_TTL_HOURS") {
            pipeline.cache_ttl_hours = v;
        }
        pipeline.validate()?;
        ranker.validate()?;

        let batch_delay =
            Duration::from_millis(env_parse("EVENTLENS_BATCH_DELAY_MS").unwrap_or(1000));
        let llm_config_file = std::env::var("EVENTLENS_LLM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/llm-config.json"));

        Ok(Self {
            port,
            pipeline,
            ranker,
            batch_delay,
            llm_config_file,
        })
    }

    fn load_file(path: &Path) -> Result<ConfigFile> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: ConfigFile = serde_json::from_str(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(parsed)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.timeout_ms, 8000);
        assert_eq!(c.max_keyphrases, 10);
        assert_eq!(c.min_score, 0.3);
        assert!(c.cache_enabled);
        assert_eq!(c.cache_ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(c.dedup_mode, DedupMode::Substring);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let c: PipelineConfig =
            serde_json::from_str(r#"{"maxRetries": 5, "dedupMode": "tokenBoundary"}"#).unwrap();
        assert_eq!(c.max_retries, 5);
        assert_eq!(c.dedup_mode, DedupMode::TokenBoundary);
        assert_eq!(c.max_keyphrases, 10);
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let c = PipelineConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_cache_ttl_saturates_and_is_bounded() {
        let c = PipelineConfig {
            cache_ttl_hours: u64::MAX,
            ..Default::default()
        };
        assert_eq!(c.cache_ttl(), Duration::from_secs(u64::MAX));
        assert!(matches!(c.validate(), Err(Error::Config(_))));

        let c = PipelineConfig {
            cache_ttl_hours: MAX_CACHE_TTL_HOURS,
            ..Default::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_ranker_validate_rejects_zero() {
        assert!(RankerConfig::default().validate().is_ok());
        let zero_top = RankerConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(matches!(zero_top.validate(), Err(Error::Config(_))));
        let zero_window = RankerConfig {
            max_events_per_request: 0,
            ..Default::default()
        };
        assert!(matches!(zero_window.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eventlens.json");
        std::fs::write(&path, r#"{"ranker": {"topN": 5}}"#).unwrap();

        let file = EventLensConfig::load_file(&path).unwrap();
        assert_eq!(file.ranker.top_n, 5);
        assert_eq!(file.pipeline, PipelineConfig::default());
    }
}
