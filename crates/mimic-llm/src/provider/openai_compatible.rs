//! Provider backed by an `OpenAI`-compatible endpoint

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use indexmap::IndexMap;
use mimic_config::{ModelConfig, ProviderConfig, ProviderKind};

use super::Provider;
use super::client::{AzureShaper, OpenAiClient, outbound_body};
use crate::error::LlmError;
use crate::overrides::apply_model_config;
use crate::recorder::{GenerationRecorder, TracingSink, TranscriptSink, record_stream};
use crate::types::{ChatRequest, ChatStream, Message};

/// Rewrite applied to every request after overrides, before it is sent
pub type RequestTransform = Arc<dyn Fn(ChatRequest) -> ChatRequest + Send + Sync>;

/// Provider for any endpoint speaking the `OpenAI` chat-completions format
pub struct OpenAiCompatibleProvider {
    name: String,
    client: OpenAiClient,
    models: IndexMap<String, ModelConfig>,
    transform: Option<RequestTransform>,
    sink: Arc<dyn TranscriptSink>,
}

impl OpenAiCompatibleProvider {
    /// Provider serving `models` through `client`
    pub fn new(name: String, client: OpenAiClient, models: Vec<ModelConfig>) -> Self {
        Self {
            name,
            client,
            models: models.into_iter().map(|m| (m.name.clone(), m)).collect(),
            transform: None,
            sink: Arc::new(TracingSink),
        }
    }

    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if no base URL is known for the provider.
    pub fn from_config(name: String, config: &ProviderConfig, http: reqwest::Client) -> Result<Self, LlmError> {
        let base_url = config
            .resolved_base_url()
            .ok_or_else(|| LlmError::Internal(anyhow::anyhow!("provider '{name}' has no base_url")))?;

        let mut client = OpenAiClient::new(http, base_url.clone(), config.api_key.clone());

        if config.kind == ProviderKind::Azure {
            let api_version = config
                .api_version
                .clone()
                .ok_or_else(|| LlmError::Internal(anyhow::anyhow!("azure provider '{name}' has no api_version")))?;

            client = client.with_shaper(Arc::new(AzureShaper::new(
                base_url,
                config.deployment.clone(),
                api_version,
                config.api_key.clone(),
            )));
        }

        let provider = Self::new(name, client, config.model_list());

        Ok(match config.kind {
            ProviderKind::DeepSeek => provider.with_transform(Arc::new(merge_consecutive_roles)),
            _ => provider,
        })
    }

    /// Set the request transform
    #[must_use]
    pub fn with_transform(mut self, transform: RequestTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Send transcripts to `sink` instead of the log
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn TranscriptSink>) -> Self {
        self.sink = sink;
        self
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_models(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    fn stream_chat(&self, request: ChatRequest) -> ChatStream {
        let model_config = self.models.get(&request.model);
        if model_config.is_none() {
            tracing::debug!(provider = %self.name, model = %request.model, "no model config, forwarding unmodified");
        }

        let (request, extra) = apply_model_config(request, model_config);
        let request = match &self.transform {
            Some(transform) => transform(request),
            None => request,
        };

        let recorder = GenerationRecorder::new(Arc::clone(&self.sink));
        match outbound_body(&request, extra.as_ref()) {
            Ok(body) => recorder.on_request(&body.to_string()),
            Err(e) => {
                recorder.dump_on_error(&e.to_string());
                return Box::pin(stream::once(async move { Err(e) }));
            }
        }

        tracing::debug!(provider = %self.name, model = %request.model, "forwarding chat request");
        record_stream(recorder, self.client.stream_chat(&request, extra.as_ref()))
    }
}

/// Merge runs of messages that share a role, joining their text with newlines
///
/// `deepseek-reasoner` rejects consecutive messages from the same role.
pub fn merge_consecutive_roles(mut request: ChatRequest) -> ChatRequest {
    let mut merged: Vec<Message> = Vec::with_capacity(request.messages.len());

    for message in request.messages {
        match merged.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push('\n');
                last.content.push_str(&message.content);
            }
            _ => merged.push(message),
        }
    }

    request.messages = merged;
    request
}
