//! Provider trait and the `OpenAI`-compatible implementation

pub mod client;
pub mod openai_compatible;

use async_trait::async_trait;

pub use client::{AzureShaper, BearerShaper, OpenAiClient, RequestShaper, UpstreamRequest};
pub use openai_compatible::{OpenAiCompatibleProvider, RequestTransform};

use crate::types::{ChatRequest, ChatStream};

/// An upstream that serves chat completions
#[async_trait]
pub trait Provider: Send + Sync {
    /// Configured provider name, used as the model id prefix
    fn name(&self) -> &str;

    /// Upstream model names, in configuration order
    fn list_models(&self) -> Vec<String>;

    /// Stream a completion for `request`
    ///
    /// Failures, including failure to reach the upstream, are reported as
    /// stream items.
    fn stream_chat(&self, request: ChatRequest) -> ChatStream;

    /// Release provider resources
    async fn close(&self) {}
}
