use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Configuration for a single upstream provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Provider kind, which selects default endpoint, models and request shaping
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Models served by this provider; falls back to the kind's default list
    #[serde(default)]
    pub models: Option<Vec<ModelConfig>>,
    /// Azure deployment name (defaults to the requested model)
    #[serde(default)]
    pub deployment: Option<String>,
    /// Azure `api-version` query parameter
    #[serde(default)]
    pub api_version: Option<String>,
}

impl ProviderConfig {
    /// Base URL to send requests to, if one is known
    pub fn resolved_base_url(&self) -> Option<Url> {
        self.base_url
            .clone()
            .or_else(|| self.kind.default_base_url().and_then(|url| Url::parse(url).ok()))
    }

    /// Configured models, or the kind's built-in list when none are configured
    pub fn model_list(&self) -> Vec<ModelConfig> {
        self.models.clone().unwrap_or_else(|| {
            self.kind
                .default_models()
                .iter()
                .map(|name| ModelConfig::named(name))
                .collect()
        })
    }
}

/// Supported upstream provider kinds
///
/// All of them speak the `OpenAI` chat-completions wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Generic OpenAI-compatible endpoint
    Openai,
    /// Alibaba `DashScope` compatible mode
    DashScope,
    /// `DeepSeek`
    DeepSeek,
    /// Mistral
    Mistral,
    /// `SiliconFlow`
    SiliconFlow,
    /// Google Gemini `OpenAI` compatibility layer
    Gemini,
    /// Anthropic `OpenAI` compatibility layer
    Claude,
    /// `OpenRouter`
    OpenRouter,
    /// Azure `OpenAI` deployments
    Azure,
}

impl ProviderKind {
    /// Well-known base URL for this kind
    pub const fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::Openai => Some("https://api.openai.com/v1"),
            Self::DashScope => Some("https://dashscope.aliyuncs.com/compatible-mode/v1"),
            Self::DeepSeek => Some("https://api.deepseek.com"),
            Self::Mistral => Some("https://api.mistral.ai/v1"),
            Self::SiliconFlow => Some("https://api.siliconflow.cn/v1"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Self::Claude => Some("https://api.anthropic.com/v1"),
            Self::OpenRouter => Some("https://openrouter.ai/api/v1"),
            Self::Azure => None,
        }
    }

    /// Models advertised when the config does not list any
    pub const fn default_models(self) -> &'static [&'static str] {
        match self {
            Self::DashScope => &["qwen-max", "qwen-plus", "qwen-turbo", "qwen-long"],
            Self::DeepSeek => &["deepseek-chat", "deepseek-reasoner"],
            Self::Mistral => &["codestral", "mistral-large"],
            _ => &[],
        }
    }
}

/// Static per-model configuration applied to every outbound request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Upstream model name, unique within its provider
    pub name: String,
    /// Temperature that replaces whatever the client asked for
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Top-level request parameters; values are coerced to JSON types
    #[serde(default)]
    pub extra_parameters: Option<IndexMap<String, String>>,
    /// Keys merged into the nested `extra_body` object
    #[serde(default)]
    pub extra_body: Option<IndexMap<String, String>>,
}

impl ModelConfig {
    /// Model entry with no overrides
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}
