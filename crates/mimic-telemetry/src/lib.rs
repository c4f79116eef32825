//! Logging setup for Mimic
//!
//! Installs a `tracing-subscriber` fmt layer, as text or JSON lines, behind an
//! `EnvFilter` built from the configured directive.

use mimic_config::{LogConfig, LogFormat};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Parse a filter directive such as `info` or `mimic_llm=debug,info`
///
/// # Errors
///
/// Returns an error if the directive is not valid `EnvFilter` syntax
pub fn env_filter(directive: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| anyhow::anyhow!("invalid log filter '{directive}': {e}"))
}

/// Initialize the global subscriber
///
/// `filter_override` replaces the configured filter directive when set.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed
pub fn init(config: &LogConfig, filter_override: Option<&str>) -> anyhow::Result<()> {
    let filter = env_filter(filter_override.unwrap_or(&config.filter))?;

    let (text_layer, json_layer) = match config.format {
        LogFormat::Text => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
