//! LM Studio dialect ↔ canonical conversions

use crate::error::LlmError;
use crate::protocol::lmstudio::{LmStudioChatRequest, LmStudioChoice, LmStudioChunk, LmStudioMessage};
use crate::types::{ChatChunk, ChatRequest, Message, Role};

impl LmStudioChatRequest {
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
            temperature: self.temperature,
            ..ChatRequest::new(upstream_model, messages)
        })
    }
}

impl LmStudioChunk {
    /// Render a canonical chunk with the response's creation timestamp
    pub fn from_canonical(chunk: &ChatChunk, created: u64) -> Self {
        Self {
            id: chunk.id.clone().unwrap_or_else(|| "null".to_owned()),
            object: "chat.completion.chunk".to_owned(),
            created,
            model: chunk.model.clone(),
            choices: chunk
                .choices
                .iter()
                .map(|choice| LmStudioChoice {
                    index: choice.index,
                    delta: LmStudioMessage {
                        role: choice.delta.role.unwrap_or(Role::Assistant).as_str().to_owned(),
                        content: choice.delta.content.clone().unwrap_or_default(),
                    },
                    finish_reason: choice.finish_reason.as_ref().map(|r| r.as_str().to_owned()),
                })
                .collect(),
        }
    }
}
