//! Chat routing core for Mimic
//!
//! Accepts chat requests in the LM Studio and Ollama dialects, forwards them
//! to `OpenAI`-compatible upstreams with per-model parameter overrides, and
//! streams the answer back in the caller's dialect.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
#[cfg(feature = "http")]
pub mod handler;
pub mod overrides;
pub mod protocol;
pub mod provider;
pub mod recorder;
pub mod routing;
pub mod sse;
pub mod state;
pub mod types;

pub use error::LlmError;
#[cfg(feature = "http")]
pub use handler::{lmstudio_router, ollama_router};
pub use provider::{OpenAiClient, OpenAiCompatibleProvider, Provider, RequestShaper, UpstreamRequest};
pub use recorder::{GenerationRecorder, TracingSink, TranscriptSink};
pub use state::LlmState;
pub use types::{ChatChunk, ChatRequest, ChatStream};
