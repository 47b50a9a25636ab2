//! learnstyle-server - HTTP surface for learning-style assessments
//!
//! Exposes the [`learnstyle_core::AssessmentEngine`] over a small JSON API:
//!
//! - `GET /api/health`
//! - `POST /api/learning-style/assess` (bearer auth)
//! - `POST /api/assessment/chat` (bearer auth, same handler)

mod error;
pub mod http;
pub mod middleware;
mod state;

use std::sync::Arc;

use tokio::net::TcpListener;

pub use error::{ApiError, ErrorResponse, ServerError};
pub use http::create_router;
pub use middleware::auth_middleware;
pub use state::AppState;

/// The learnstyle HTTP server
pub struct LearnStyleServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl LearnStyleServer {
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        self.run_with_listener(listener).await
    }

    /// Run the server on an already-bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        tracing::info!(
            addr = %local_addr,
            provider = self.state.engine.provider_name(),
            "learnstyle server listening"
        );

        let router = create_router(self.state);
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "127.0.0.1:8787")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
