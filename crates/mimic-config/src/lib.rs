//! Configuration for the Mimic gateway
//!
//! Loaded from a TOML file with `{{ env.VAR }}` placeholder expansion.

#![allow(clippy::must_use_candidate)]

mod env;
pub mod health;
mod loader;
pub mod log;
pub mod provider;
pub mod server;

use indexmap::IndexMap;
use serde::Deserialize;

pub use health::*;
pub use log::*;
pub use provider::*;
pub use server::*;

/// Top-level Mimic configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log output configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Health endpoint served by both dialect servers
    #[serde(default)]
    pub health: HealthConfig,
    /// LM Studio emulation server
    #[serde(default)]
    pub lm_studio: DialectServerConfig,
    /// Ollama emulation server
    #[serde(default)]
    pub ollama: DialectServerConfig,
    /// Upstream providers keyed by the prefix clients use in model ids
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
}
