//! Test server wrapper that starts Mimic on random ports

use std::net::SocketAddr;

use mimic_config::Config;
use mimic_server::{Dialect, Server};
use tokio_util::sync::CancellationToken;

/// Both dialect servers running on ephemeral ports
pub struct TestServer {
    lm_studio: Option<SocketAddr>,
    ollama: Option<SocketAddr>,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start every enabled dialect with the given configuration
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(&config)?;
        let shutdown = CancellationToken::new();
        let mut lm_studio = None;
        let mut ollama = None;

        for (dialect, router) in server.into_routers() {
            // Bind the listener here so we know the actual port
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
            let addr = listener.local_addr()?;

            match dialect {
                Dialect::LmStudio => lm_studio = Some(addr),
                Dialect::Ollama => ollama = Some(addr),
            }

            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await
                    .ok();
            });
        }

        Ok(Self {
            lm_studio,
            ollama,
            shutdown,
            client: reqwest::Client::new(),
        })
    }

    /// URL on the LM Studio server
    pub fn lm_studio_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.lm_studio.expect("LM Studio enabled"))
    }

    /// URL on the Ollama server
    pub fn ollama_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.ollama.expect("Ollama enabled"))
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
