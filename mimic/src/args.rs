use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Mimic local inference gateway
#[derive(Debug, Parser)]
#[command(
    name = "mimic",
    about = "Serve the LM Studio and Ollama APIs on top of OpenAI-compatible providers"
)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mimic.toml", env = "MIMIC_CONFIG")]
    pub config: PathBuf,

    /// Override the LM Studio listen address
    #[arg(long, env = "MIMIC_LM_STUDIO_LISTEN")]
    pub lm_studio_listen: Option<SocketAddr>,

    /// Override the Ollama listen address
    #[arg(long, env = "MIMIC_OLLAMA_LISTEN")]
    pub ollama_listen: Option<SocketAddr>,

    /// Override the configured log filter, e.g. `mimic_llm=debug,info`
    #[arg(long, env = "MIMIC_LOG")]
    pub log: Option<String>,
}
