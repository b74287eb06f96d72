//! HTTP server: shared state, route table, and the listener loop.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderName,
    response::Json as AxumJson,
    routing::{any, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use vedastro::VedAstroClient;

use super::registry::SessionRegistry;
use super::session::{self, SESSION_HEADER};
use super::streamable;
use crate::config::ServerConfig;
use crate::types::{McpError, McpResult, SERVER_NAME};

/// Shared server state passed to all handlers via axum State.
pub struct AppState {
    pub config: ServerConfig,
    /// Base client; each engine gets a copy bound to its caller's credential.
    pub client: VedAstroClient,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: ServerConfig) -> McpResult<Self> {
        let client = VedAstroClient::with_timeout(&config.api_base, None, config.timeout)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ServerConfig, client: VedAstroClient) -> Self {
        Self {
            config,
            client,
            sessions: SessionRegistry::new(),
        }
    }
}

/// Routes relative to the mount point. Callers nest this under the base path.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

    Router::new()
        .route("/mcp", any(streamable::handle_mcp))
        .route("/sse", any(session::handle_establish))
        .route("/messages", any(session::handle_submit))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Mount the routes under the configured base path.
pub fn mounted_router(state: Arc<AppState>) -> Router {
    let base_path = state.config.base_path.clone();
    let routes = create_router(state);
    if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&base_path, routes)
    }
}

/// The listening server.
pub struct HttpServer {
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> McpResult<Self> {
        Ok(Self {
            state: Arc::new(AppState::new(config)?),
        })
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(&self) -> McpResult<()> {
        let addr = self.state.config.addr.clone();
        let app = mounted_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(McpError::Io)?;

        let base = &self.state.config.base_path;
        tracing::info!("HTTP transport listening on {addr}");
        tracing::info!("Streaming endpoint: {base}/mcp");
        tracing::info!("Session stream: {base}/sse, messages: {base}/messages");

        axum::serve(listener, app)
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> AxumJson<serde_json::Value> {
    let sessions = state.sessions.snapshot();
    let mut initialized = 0;
    for session in &sessions {
        if session.engine().is_initialized().await {
            initialized += 1;
        }
    }

    AxumJson(serde_json::json!({
        "status": "ok",
        "server": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": sessions.len(),
        "initialized": initialized,
    }))
}
