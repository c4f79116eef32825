//! Axum route handlers for the LM Studio and Ollama dialects

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};

use crate::error::LlmError;
use crate::protocol::lmstudio::{LmStudioChatRequest, LmStudioChunk, LmStudioModel, LmStudioModelList};
use crate::protocol::ollama::{OllamaChatRequest, OllamaChunk, OllamaModel, OllamaModelDetails, OllamaTags};
use crate::routing::split_model_id;
use crate::sse::STREAM_END_TOKEN;
use crate::state::LlmState;
use crate::types::ChatStream;

/// Timestamp reported for every model in `/api/tags`
const MODEL_MODIFIED_AT: &str = "2024-01-01T00:00:00Z";

/// Build the LM Studio router (`/api/v0/...`)
pub fn lmstudio_router(state: LlmState) -> Router {
    Router::new()
        .route("/api/v0/models", routing::get(lmstudio_list_models))
        .route("/api/v0/chat/completions", routing::post(lmstudio_chat_completions))
        .with_state(state)
}

/// Build the Ollama router (`/api/...`)
pub fn ollama_router(state: LlmState) -> Router {
    Router::new()
        .route("/", routing::get(ollama_root))
        .route("/api/tags", routing::get(ollama_tags))
        .route("/api/chat", routing::post(ollama_chat))
        .route("/api/show", routing::post(ollama_show))
        .with_state(state)
}

impl IntoResponse for LlmError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "chat request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "chat request rejected");
        }

        (status, self.to_string()).into_response()
    }
}

/// Wait for the first item so that a failed upstream open becomes an error
/// response instead of an empty stream
async fn open_stream(mut upstream: ChatStream) -> Result<ChatStream, LlmError> {
    match upstream.next().await {
        Some(Ok(first)) => Ok(Box::pin(stream::iter([Ok(first)]).chain(upstream))),
        Some(Err(e)) => Err(e),
        None => Ok(upstream),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// -- LM Studio handlers --

/// Handle `GET /api/v0/models`
async fn lmstudio_list_models(State(state): State<LlmState>) -> Json<LmStudioModelList> {
    let data = state
        .list_models()
        .into_iter()
        .map(|id| {
            let publisher = split_model_id(&id).provider_name.to_owned();
            LmStudioModel::loaded(id, publisher)
        })
        .collect();

    Json(LmStudioModelList {
        object: "list".to_owned(),
        data,
    })
}

/// Handle `POST /api/v0/chat/completions`
async fn lmstudio_chat_completions(
    State(state): State<LlmState>,
    Json(wire_request): Json<LmStudioChatRequest>,
) -> Result<Response, LlmError> {
    let (provider, model) = state.resolve(&wire_request.model)?;
    let request = wire_request.into_canonical(&model)?;
    let upstream = open_stream(provider.stream_chat(request)).await?;

    let created = unix_now();
    let events = upstream
        .map(move |item| match item {
            Ok(chunk) => Event::default().json_data(LmStudioChunk::from_canonical(&chunk, created)),
            Err(e) => {
                tracing::error!(error = %e, "aborting LM Studio stream");
                Err(axum::Error::new(e))
            }
        })
        .chain(stream::once(async { Ok(Event::default().data(STREAM_END_TOKEN)) }));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()).into_response())
}

// -- Ollama handlers --

/// Handle `GET /`
async fn ollama_root() -> &'static str {
    "Ollama is running"
}

/// Handle `GET /api/tags`
async fn ollama_tags(State(state): State<LlmState>) -> Json<OllamaTags> {
    let models = state
        .list_models()
        .into_iter()
        .map(|id| OllamaModel {
            name: id.clone(),
            model: id,
            modified_at: MODEL_MODIFIED_AT.to_owned(),
            size: 0,
            digest: String::new(),
            details: OllamaModelDetails::default(),
        })
        .collect();

    Json(OllamaTags { models })
}

/// Handle `POST /api/chat`
async fn ollama_chat(
    State(state): State<LlmState>,
    Json(wire_request): Json<OllamaChatRequest>,
) -> Result<Response, LlmError> {
    let (provider, model) = state.resolve(&wire_request.model)?;
    let request = wire_request.into_canonical(&model)?;
    let upstream = open_stream(provider.stream_chat(request)).await?;

    let lines = upstream.map(|item| {
        item.and_then(|chunk| {
            let mut line =
                serde_json::to_vec(&OllamaChunk::from_canonical(&chunk)).map_err(|e| LlmError::Internal(e.into()))?;
            line.push(b'\n');
            Ok(line)
        })
        .inspect_err(|e| tracing::error!(error = %e, "aborting Ollama stream"))
    });

    Ok(([(header::CONTENT_TYPE, "application/x-ndjson")], Body::from_stream(lines)).into_response())
}

/// Handle `POST /api/show`; the body is ignored
async fn ollama_show() -> Json<Value> {
    Json(mock_model_info())
}

/// Fixed model description returned for every model
fn mock_model_info() -> Value {
    json!({
        "modelfile": "Mock modelfile",
        "parameters": "Mock parameters",
        "template": "Mock template",
        "details": OllamaModelDetails::default(),
        "model_info": {
            "general.architecture": "llama",
            "general.file_type": 2,
            "general.parameter_count": 8_030_261_248_u64,
            "general.quantization_version": 2,
            "llama.attention.head_count": 32,
            "llama.attention.head_count_kv": 8,
            "llama.attention.layer_norm_rms_epsilon": 0.000_01,
            "llama.block_count": 32,
            "llama.context_length": 8192,
            "llama.embedding_length": 4096,
            "llama.feed_forward_length": 14336,
            "llama.rope.dimension_count": 128,
            "llama.rope.freq_base": 500_000,
            "llama.vocab_size": 128_256,
            "tokenizer.ggml.bos_token_id": 128_000,
            "tokenizer.ggml.eos_token_id": 128_009,
            "tokenizer.ggml.merges": [],
            "tokenizer.ggml.model": "gpt2",
            "tokenizer.ggml.pre": "llama-bpe",
            "tokenizer.ggml.token_type": [],
            "tokenizer.ggml.tokens": []
        }
    })
}
