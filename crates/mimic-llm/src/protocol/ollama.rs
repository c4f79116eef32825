//! Ollama API wire format

use serde::{Deserialize, Serialize};

/// `POST /api/chat` body
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatRequest {
    /// `<provider>/<model>` id
    pub model: String,
    /// Conversation messages
    pub messages: Vec<OllamaMessage>,
    /// Generation options
    #[serde(default)]
    pub options: OllamaOptions,
    /// Ignored; responses always stream
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Generation options; only temperature is honored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaOptions {
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Message within a request or chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaMessage {
    /// Message role
    pub role: String,
    /// Text content
    #[serde(default)]
    pub content: String,
}

/// One NDJSON line of a streamed chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChunk {
    /// Model that produced the chunk
    pub model: String,
    /// Assistant message delta
    pub message: OllamaMessage,
    /// Whether this is the last line
    pub done: bool,
}

/// `GET /api/tags` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaTags {
    /// Available models
    pub models: Vec<OllamaModel>,
}

/// Model entry in the tags listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModel {
    /// `<provider>/<model>` id
    pub name: String,
    /// Same as `name`
    pub model: String,
    /// Modification timestamp (RFC 3339)
    pub modified_at: String,
    /// Size on disk, always zero for remote models
    pub size: u64,
    /// Content digest, empty for remote models
    pub digest: String,
    /// Model details
    pub details: OllamaModelDetails,
}

/// Model details reported by tags and show
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaModelDetails {
    /// Parent model name
    pub parent_model: String,
    /// Weight file format
    pub format: String,
    /// Model family
    pub family: String,
    /// All families
    pub families: Vec<String>,
    /// Human readable parameter count
    pub parameter_size: String,
    /// Quantization level
    pub quantization_level: String,
}

impl Default for OllamaModelDetails {
    fn default() -> Self {
        Self {
            parent_model: String::new(),
            format: "gguf".to_owned(),
            family: "llama".to_owned(),
            families: vec!["llama".to_owned()],
            parameter_size: "8.0B".to_owned(),
            quantization_level: "Q4_0".to_owned(),
        }
    }
}
