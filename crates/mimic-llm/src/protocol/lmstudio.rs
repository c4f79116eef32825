//! LM Studio REST API (`/api/v0`) wire format

use serde::{Deserialize, Serialize};

/// `POST /api/v0/chat/completions` body
#[derive(Debug, Clone, Deserialize)]
pub struct LmStudioChatRequest {
    /// `<provider>/<model>` id
    pub model: String,
    /// Conversation messages
    pub messages: Vec<LmStudioMessage>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Ignored; responses always stream
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Message within an LM Studio request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LmStudioMessage {
    /// Message role
    pub role: String,
    /// Text content
    #[serde(default)]
    pub content: String,
}

/// Streamed completion chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmStudioChunk {
    /// Completion id, `"null"` when upstream sent none
    pub id: String,
    /// Always `chat.completion.chunk`
    pub object: String,
    /// Creation timestamp
    pub created: u64,
    /// Model that produced the chunk
    pub model: String,
    /// Delta choices
    pub choices: Vec<LmStudioChoice>,
}

/// Choice within a chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmStudioChoice {
    /// Choice index
    pub index: u32,
    /// Incremental update
    pub delta: LmStudioMessage,
    /// Finish reason, `null` until the last chunk
    pub finish_reason: Option<String>,
}

/// `GET /api/v0/models` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmStudioModelList {
    /// Always `list`
    pub object: String,
    /// Available models
    pub data: Vec<LmStudioModel>,
}

/// Model entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmStudioModel {
    /// `<provider>/<model>` id
    pub id: String,
    /// Always `model`
    pub object: String,
    /// Always `llm`
    #[serde(rename = "type")]
    pub model_type: String,
    /// Provider name
    pub publisher: String,
    /// Always `loaded`
    pub state: String,
}

impl LmStudioModel {
    /// Entry for a loaded LLM
    pub fn loaded(id: String, publisher: String) -> Self {
        Self {
            id,
            object: "model".to_owned(),
            model_type: "llm".to_owned(),
            publisher,
            state: "loaded".to_owned(),
        }
    }
}
