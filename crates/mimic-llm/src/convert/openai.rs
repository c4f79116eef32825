//! Canonical ↔ `OpenAI` wire conversions

use crate::protocol::openai::{OpenAiMessage, OpenAiRequest, OpenAiStreamChoice, OpenAiStreamChunk};
use crate::types::{ChatChunk, ChatRequest, ChunkChoice, ChunkDelta, FinishReason, Message};

// -- Canonical → OpenAI (outbound request) --

impl From<&ChatRequest> for OpenAiRequest {
    fn from(req: &ChatRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: req.messages.iter().map(Into::into).collect(),
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            top_p: req.top_p,
            frequency_penalty: req.frequency_penalty,
            presence_penalty: req.presence_penalty,
            seed: req.seed,
            n: req.n,
            stop: req.stop.clone(),
            stream: Some(true),
            extra_body: req.extra_body.clone(),
        }
    }
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

// -- OpenAI → Canonical (stream chunks) --

impl From<OpenAiStreamChunk> for ChatChunk {
    fn from(chunk: OpenAiStreamChunk) -> Self {
        Self {
            id: chunk.id,
            model: chunk.model,
            choices: chunk.choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<OpenAiStreamChoice> for ChunkChoice {
    fn from(choice: OpenAiStreamChoice) -> Self {
        Self {
            index: choice.index,
            delta: ChunkDelta {
                // Upstreams occasionally send roles we do not model; the delta role is informational only
                role: choice.delta.role.and_then(|role| role.parse().ok()),
                content: choice.delta.content,
                reasoning_content: choice.delta.reasoning_content,
            },
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        }
    }
}
