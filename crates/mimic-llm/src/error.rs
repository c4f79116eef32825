use http::StatusCode;
use thiserror::Error;

/// Errors that can occur while serving a chat request
#[derive(Debug, Error)]
pub enum LlmError {
    /// Model id prefix does not name a configured provider
    #[error("provider not found: {provider}")]
    ProviderNotFound { provider: String },

    /// Requested model is not served by the provider
    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    /// Client sent a malformed or unsupported request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream could not be reached or rejected the request
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Upstream stream could not be read or decoded
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// HTTP status reported to the inbound client
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ProviderNotFound { .. } | Self::ModelNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Streaming(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
