//! Ollama dialect ↔ canonical conversions

use crate::error::LlmError;
use crate::protocol::ollama::{OllamaChatRequest, OllamaChunk, OllamaMessage};
use crate::types::{ChatChunk, ChatRequest, Message, Role};

impl OllamaChatRequest {
    /// Convert to a canonical request addressed to `upstream_model`
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidRequest` for an unsupported message role
    pub fn into_canonical(self, upstream_model: &str) -> Result<ChatRequest, LlmError> {
        let messages = self
            .messages
            .into_iter()
            .map(|m| m.role.parse().map(|role| Message::new(role, m.content)))
            .collect::<Result<Vec<_>, LlmError>>()?;

        Ok(ChatRequest {
            temperature: self.options.temperature,
            ..ChatRequest::new(upstream_model, messages)
        })
    }
}

impl OllamaChunk {
    /// Render a canonical chunk as one NDJSON line
    pub fn from_canonical(chunk: &ChatChunk) -> Self {
        let first = chunk.first_choice();

        Self {
            model: chunk.model.clone(),
            message: OllamaMessage {
                role: Role::Assistant.as_str().to_owned(),
                content: first.and_then(|c| c.delta.content.clone()).unwrap_or_default(),
            },
            done: first.is_some_and(|c| c.finish_reason.is_some()),
        }
    }
}
