//! Transport abstraction and timeout handling.

use std::sync::Arc;
use std::time::Duration;

use eventlens_core::{Error, Result};
use futures::future::BoxFuture;
use tracing::warn;

use crate::types::CompletionRequest;

/// Something that turns a prompt into a free-text reply.
pub trait LlmTransport: Send + Sync {
    /// Start a completion. The returned future owns everything it needs so it
    /// can keep running after the caller stops waiting.
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'static, Result<String>>;

    /// Whether a real endpoint is configured.
    fn is_available(&self) -> bool {
        true
    }
}

/// Run one completion, giving up after `timeout`.
///
/// The request runs on its own task. On timeout only the wait is abandoned;
/// the request itself is left to finish and its reply is dropped.
pub async fn complete_with_timeout(
    transport: &Arc<dyn LlmTransport>,
    request: CompletionRequest,
    timeout: Duration,
) -> Result<String> {
    let handle = tokio::spawn(transport.complete(request));

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(join_err)) => Err(Error::Internal(format!("completion task failed: {}", join_err))),
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            warn!("LLM call exceeded {}ms; no longer waiting", timeout_ms);
            Err(Error::Timeout { timeout_ms })
        }
    }
}
