//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use eventlens_cache::InMemoryKeyphraseCache;
use eventlens_core::{EventLensConfig, Result};
use eventlens_enhance::KeyphrasePipeline;
use eventlens_llm::{
    CompletionRequest, LlmConfig, LlmTransport, ProviderClient, UnconfiguredTransport,
};
use eventlens_rank::RelevanceRanker;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::info;

use crate::registry::EventRegistry;

/// Transport whose backing provider can be swapped at runtime.
///
/// Calls already in flight keep the provider they started with.
pub struct LiveTransport {
    inner: RwLock<Arc<dyn LlmTransport>>,
}

impl LiveTransport {
    pub fn new(inner: Arc<dyn LlmTransport>) -> Self {
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub fn replace(&self, inner: Arc<dyn LlmTransport>) {
        *self.inner.write() = inner;
    }
}

impl LlmTransport for LiveTransport {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'static, Result<String>> {
        let inner = self.inner.read().clone();
        inner.complete(request)
    }

    fn is_available(&self) -> bool {
        self.inner.read().is_available()
    }
}

/// Client for whichever provider `config` resolves to, or a stand-in that always fails.
pub fn transport_for(config: &LlmConfig) -> Arc<dyn LlmTransport> {
    match ProviderClient::from_config(config) {
        Some(client) => {
            info!("LLM provider: {} ({})", client.provider(), client.model());
            Arc::new(client)
        }
        None => {
            info!("No LLM provider configured; keyphrases will be lexical only");
            Arc::new(UnconfiguredTransport)
        }
    }
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: EventLensConfig,
    pub pipeline: KeyphrasePipeline,
    pub ranker: RelevanceRanker,
    pub events: EventRegistry,
    pub llm_config: RwLock<LlmConfig>,
    pub transport: Arc<LiveTransport>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: EventLensConfig, llm_config: LlmConfig) -> Self {
        let transport = transport_for(&llm_config);
        Self::with_transport(config, llm_config, transport)
    }

    /// Build state around an explicit transport.
    pub fn with_transport(
        config: EventLensConfig,
        llm_config: LlmConfig,
        transport: Arc<dyn LlmTransport>,
    ) -> Self {
        let transport = Arc::new(LiveTransport::new(transport));
        let cache = Arc::new(InMemoryKeyphraseCache::new(config.pipeline.cache_max_entries));

        let pipeline = KeyphrasePipeline::new(transport.clone(), cache, config.pipeline.clone());
        let ranker = RelevanceRanker::new(transport.clone(), config.ranker.clone());

        Self {
            config,
            pipeline,
            ranker,
            events: EventRegistry::new(),
            llm_config: RwLock::new(llm_config),
            transport,
            started_at: Instant::now(),
        }
    }
}
