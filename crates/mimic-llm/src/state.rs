//! Provider table shared by both dialect routers

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use mimic_config::Config;

use crate::error::LlmError;
use crate::provider::{OpenAiCompatibleProvider, Provider};
use crate::routing::{qualified_model_id, split_model_id};

/// Upper bound for establishing an upstream connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state for dialect route handlers
#[derive(Clone)]
pub struct LlmState {
    inner: Arc<LlmStateInner>,
}

struct LlmStateInner {
    providers: IndexMap<String, Arc<dyn Provider>>,
}

impl LlmState {
    /// Build every configured provider around one shared HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or any provider fails to initialize.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

        Self::from_config_with_client(config, &http)
    }

    /// Build every configured provider around `http`
    ///
    /// # Errors
    ///
    /// Returns an error if any provider fails to initialize.
    pub fn from_config_with_client(config: &Config, http: &reqwest::Client) -> Result<Self, LlmError> {
        let providers = config
            .providers
            .iter()
            .map(|(name, provider_config)| {
                let provider = OpenAiCompatibleProvider::from_config(name.clone(), provider_config, http.clone())?;
                tracing::debug!(
                    provider = %name,
                    kind = ?provider_config.kind,
                    models = provider.list_models().len(),
                    "provider initialized"
                );
                Ok(Arc::new(provider) as Arc<dyn Provider>)
            })
            .collect::<Result<Vec<_>, LlmError>>()?;

        Ok(Self::from_providers(providers))
    }

    /// State over already-constructed providers, keyed by their names
    pub fn from_providers(providers: impl IntoIterator<Item = Arc<dyn Provider>>) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.name().to_owned(), provider))
            .collect();

        Self {
            inner: Arc::new(LlmStateInner { providers }),
        }
    }

    /// Provider and upstream model name for a client model id
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ProviderNotFound` when the prefix names no provider
    /// and `LlmError::ModelNotFound` when the model name after it is empty.
    pub fn resolve(&self, model_id: &str) -> Result<(Arc<dyn Provider>, String), LlmError> {
        let resolved = split_model_id(model_id);

        let provider = self
            .inner
            .providers
            .get(resolved.provider_name)
            .ok_or_else(|| LlmError::ProviderNotFound {
                provider: resolved.provider_name.to_owned(),
            })?;

        if resolved.model_id.is_empty() {
            return Err(LlmError::ModelNotFound {
                model: model_id.to_owned(),
            });
        }

        Ok((Arc::clone(provider), resolved.model_id.to_owned()))
    }

    /// Every `<provider>/<model>` id, in configuration order
    pub fn list_models(&self) -> Vec<String> {
        self.inner
            .providers
            .iter()
            .flat_map(|(name, provider)| {
                provider
                    .list_models()
                    .into_iter()
                    .map(move |model| qualified_model_id(name, &model))
            })
            .collect()
    }

    /// Close every provider
    pub async fn close(&self) {
        for provider in self.inner.providers.values() {
            provider.close().await;
        }
    }
}
