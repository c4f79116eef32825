//! HTTP servers for the emulated LM Studio and Ollama APIs
//!
//! Each enabled dialect gets its own listener. Both share one provider table.

#![allow(clippy::must_use_candidate)]

use std::fmt;
use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Request;
use axum::{Router, routing};
use futures_util::future::try_join_all;
use mimic_config::{Config, DialectServerConfig, HealthConfig};
use mimic_llm::LlmState;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Emulated local-inference API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// LM Studio REST API
    LmStudio,
    /// Ollama API
    Ollama,
}

impl Dialect {
    /// Short name used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::LmStudio => "lm_studio",
            Self::Ollama => "ollama",
        }
    }

    /// Address the real server listens on by default
    pub fn default_listen_address(self) -> SocketAddr {
        match self {
            Self::LmStudio => SocketAddr::from(([127, 0, 0, 1], 1234)),
            Self::Ollama => SocketAddr::from(([127, 0, 0, 1], 11434)),
        }
    }

    fn routes(self, state: LlmState) -> Router {
        match self {
            Self::LmStudio => mimic_llm::lmstudio_router(state),
            Self::Ollama => mimic_llm::ollama_router(state),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One dialect's router and bind address
struct DialectServer {
    dialect: Dialect,
    router: Router,
    listen_address: SocketAddr,
}

/// Assembled servers for every enabled dialect
pub struct Server {
    servers: Vec<DialectServer>,
    state: LlmState,
}

impl Server {
    /// Build providers and routers from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if provider initialization fails
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let state = LlmState::from_config(config)?;
        Ok(Self::with_state(config, state))
    }

    /// Build routers around an existing provider table
    pub fn with_state(config: &Config, state: LlmState) -> Self {
        let servers = [(Dialect::LmStudio, &config.lm_studio), (Dialect::Ollama, &config.ollama)]
            .into_iter()
            .filter(|(_, server)| server.enabled)
            .map(|(dialect, server)| DialectServer {
                dialect,
                router: dialect_router(dialect, server, &config.health, state.clone()),
                listen_address: server
                    .listen_address
                    .unwrap_or_else(|| dialect.default_listen_address()),
            })
            .collect();

        Self { servers, state }
    }

    /// Configured listen address of every enabled dialect
    pub fn listen_addresses(&self) -> Vec<(Dialect, SocketAddr)> {
        self.servers.iter().map(|s| (s.dialect, s.listen_address)).collect()
    }

    /// Consume the server and return the routers
    ///
    /// Useful for testing when the caller manages the listeners
    pub fn into_routers(self) -> Vec<(Dialect, Router)> {
        self.servers.into_iter().map(|s| (s.dialect, s.router)).collect()
    }

    /// Start serving requests
    ///
    /// All listeners are bound before any request is accepted. Blocks until
    /// the cancellation token is triggered or a server fails.
    ///
    /// # Errors
    ///
    /// Returns an error if binding a TCP listener or serving fails
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let mut bound = Vec::with_capacity(self.servers.len());

        for server in self.servers {
            let listener = TcpListener::bind(server.listen_address).await.map_err(|e| {
                anyhow::anyhow!(
                    "failed to bind {} server to {}: {e}",
                    server.dialect,
                    server.listen_address
                )
            })?;
            let local_addr = listener.local_addr()?;
            tracing::info!(dialect = %server.dialect, %local_addr, "server listening");
            bound.push((server.dialect, listener, server.router));
        }

        let running = bound.into_iter().map(|(dialect, listener, router)| {
            let shutdown = shutdown.clone();
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                        tracing::info!(%dialect, "graceful shutdown initiated");
                    })
                    .await
                    .map_err(|e| anyhow::anyhow!("{dialect} server failed: {e}"))
            }
        });

        let result = try_join_all(running).await.map(|_| ());
        self.state.close().await;
        result
    }
}

fn dialect_router(dialect: Dialect, server: &DialectServerConfig, health: &HealthConfig, state: LlmState) -> Router {
    let routes = dialect.routes(state);

    let mut app = if server.path.is_empty() {
        routes
    } else {
        Router::new().nest(&server.path, routes)
    };

    if health.enabled {
        app = app.route(&health.path, routing::get(health_handler));
    }

    let name = dialect.name();
    app.layer(TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        tracing::info_span!(
            "request",
            dialect = name,
            method = %request.method(),
            uri = %request.uri(),
        )
    }))
}

/// Health check handler
async fn health_handler() -> &'static str {
    "ok"
}
