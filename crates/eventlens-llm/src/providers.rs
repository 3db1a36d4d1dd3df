//! HTTP completion clients for external LLM providers.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API with a separate `system` field.

use eventlens_core::{Error, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::LlmConfig;
use crate::transport::LlmTransport;
use crate::types::{CompletionRequest, LLMProvider};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicMessage {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Completion client bound to one provider, model and key.
#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: String,
}

impl ProviderClient {
    pub fn new(
        client: Client,
        provider: LLMProvider,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            provider,
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client for whichever provider `config` resolves to.
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        config
            .resolve_provider()
            .map(|(provider, model, key)| Self::new(Client::new(), provider, model, key))
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_openai_compat(
        self,
        url: &'static str,
        request: CompletionRequest,
    ) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        debug!("Completion via {} with model {}", url, self.model);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {}: {}", status, body)));
        }

        let parsed: ChatCompletion = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Unreadable completion: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Llm("Completion had no content".into()))
    }

    async fn complete_anthropic(self, request: CompletionRequest) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if let Some(system) = request.system {
            body["system"] = json!(system);
        }

        debug!("Completion via Anthropic with model {}", self.model);

        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {}: {}", status, body)));
        }

        let parsed: AnthropicMessage = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Unreadable completion: {}", e)))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        if text.is_empty() {
            return Err(Error::Llm("Completion had no text blocks".into()));
        }
        Ok(text)
    }
}

impl LlmTransport for ProviderClient {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'static, Result<String>> {
        let this = self.clone();
        match self.provider {
            LLMProvider::OpenAI => Box::pin(this.complete_openai_compat(OPENAI_URL, request)),
            LLMProvider::Groq => Box::pin(this.complete_openai_compat(GROQ_URL, request)),
            LLMProvider::Anthropic => Box::pin(this.complete_anthropic(request)),
        }
    }
}

/// Stand-in when no provider key is configured. Every call fails fast, so
/// extraction degrades to lexical output and ranking reports an error.
pub struct UnconfiguredTransport;

impl LlmTransport for UnconfiguredTransport {
    fn complete(&self, _request: CompletionRequest) -> BoxFuture<'static, Result<String>> {
        Box::pin(async { Err(Error::Llm("No LLM provider configured".into())) })
    }

    fn is_available(&self) -> bool {
        false
    }
}
