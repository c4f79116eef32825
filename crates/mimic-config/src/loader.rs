use std::collections::HashSet;
use std::path::Path;

use crate::{Config, DialectServerConfig, ProviderKind};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured, a provider is
    /// misconfigured, or no dialect server is enabled
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_servers()?;
        self.validate_providers()?;
        Ok(())
    }

    fn validate_servers(&self) -> anyhow::Result<()> {
        if !self.lm_studio.enabled && !self.ollama.enabled {
            anyhow::bail!("at least one of lm_studio or ollama must be enabled");
        }

        validate_path_prefix("lm_studio", &self.lm_studio)?;
        validate_path_prefix("ollama", &self.ollama)?;

        let health = self.health.path.as_str();
        if !health.starts_with('/') {
            anyhow::bail!("health.path must start with '/'");
        }
        if health == "/" || health == "/api" || health.starts_with("/api/") {
            anyhow::bail!("health.path '{health}' collides with an emulated API route");
        }

        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        if self.providers.is_empty() {
            anyhow::bail!("at least one provider must be configured");
        }

        for (name, provider) in &self.providers {
            if name.is_empty() || name.contains('/') {
                anyhow::bail!("provider name '{name}' must be non-empty and must not contain '/'");
            }

            if provider.resolved_base_url().is_none() {
                anyhow::bail!("provider '{name}' requires base_url");
            }

            if provider.kind == ProviderKind::Azure && provider.api_version.is_none() {
                anyhow::bail!("azure provider '{name}' requires api_version");
            }

            let mut seen = HashSet::new();
            for model in provider.models.iter().flatten() {
                if model.name.is_empty() {
                    anyhow::bail!("provider '{name}' has a model with an empty name");
                }
                if !seen.insert(model.name.as_str()) {
                    anyhow::bail!("provider '{name}' lists model '{}' more than once", model.name);
                }
            }
        }

        Ok(())
    }
}

fn validate_path_prefix(section: &str, server: &DialectServerConfig) -> anyhow::Result<()> {
    let path = server.path.as_str();

    if path.is_empty() {
        return Ok(());
    }

    if !path.starts_with('/') || path.ends_with('/') {
        anyhow::bail!("{section}.path must start with '/' and must not end with '/' (got '{path}')");
    }

    Ok(())
}
