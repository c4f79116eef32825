//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use indexmap::IndexMap;
use mimic_config::{Config, DialectServerConfig, ModelConfig, ProviderConfig, ProviderKind};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Both dialects enabled on ephemeral ports, no providers
    pub fn new() -> Self {
        let ephemeral = || DialectServerConfig {
            listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
            ..DialectServerConfig::default()
        };

        Self {
            config: Config {
                lm_studio: ephemeral(),
                ollama: ephemeral(),
                ..Config::default()
            },
        }
    }

    /// Add an `OpenAI` provider pointed at a mock upstream
    pub fn with_openai_provider(self, name: &str, base_url: &str, models: Vec<ModelConfig>) -> Self {
        self.with_provider(name, ProviderKind::Openai, base_url, models)
    }

    /// Add an Azure provider pointed at a mock upstream
    pub fn with_azure_provider(mut self, name: &str, base_url: &str, deployment: Option<&str>) -> Self {
        self = self.with_provider(name, ProviderKind::Azure, base_url, vec![ModelConfig::named("gpt-4o")]);
        let provider = &mut self.config.providers[name];
        provider.deployment = deployment.map(str::to_owned);
        provider.api_version = Some("2024-06-01".to_owned());
        self
    }

    fn with_provider(mut self, name: &str, kind: ProviderKind, base_url: &str, models: Vec<ModelConfig>) -> Self {
        self.config.providers.insert(
            name.to_owned(),
            ProviderConfig {
                kind,
                api_key: Some(SecretString::from("test-key")),
                base_url: Some(base_url.parse().expect("valid URL")),
                models: Some(models),
                deployment: None,
                api_version: None,
            },
        );
        self
    }

    /// Serve the LM Studio routes under `prefix`
    pub fn with_lm_studio_prefix(mut self, prefix: &str) -> Self {
        prefix.clone_into(&mut self.config.lm_studio.path);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("valid test config");
        self.config
    }
}

/// Model entry with a temperature and parameter overrides
pub fn model_with_overrides(
    name: &str,
    temperature: Option<f64>,
    extra_parameters: &[(&str, &str)],
    extra_body: &[(&str, &str)],
) -> ModelConfig {
    let map = |pairs: &[(&str, &str)]| {
        (!pairs.is_empty()).then(|| {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<IndexMap<_, _>>()
        })
    };

    ModelConfig {
        name: name.to_owned(),
        temperature,
        extra_parameters: map(extra_parameters),
        extra_body: map(extra_body),
    }
}
