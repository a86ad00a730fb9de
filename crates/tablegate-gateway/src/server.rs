//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires a [`RecordBackend`] and the gateway settings into
//! a running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Liveness check, always `200 OK`. |
//! | `GET`    | `/{baseID}/{tableIDOrName}` | List records. |
//! | `POST`   | `/{baseID}/{tableIDOrName}` | Create records. |
//! | `DELETE` | `/{baseID}/{tableIDOrName}` | Delete records. |

use crate::handlers::{health_router, records_router};
use crate::state::AppState;
use axum::Router;
use std::sync::Arc;
use tablegate_kernel::{GatewaySettings, RecordBackend};
use tower_http::trace::TraceLayer;
use tracing::info;

/// High-level gateway server encapsulating settings and the backend.
pub struct GatewayServer {
    settings: GatewaySettings,
    backend: Arc<dyn RecordBackend>,
}

impl GatewayServer {
    /// Create a new server from settings and a backend.
    pub fn new(settings: GatewaySettings, backend: impl RecordBackend + 'static) -> Self {
        Self::with_shared_backend(settings, Arc::new(backend))
    }

    /// Create a server around an already shared backend.
    pub fn with_shared_backend(settings: GatewaySettings, backend: Arc<dyn RecordBackend>) -> Self {
        Self { settings, backend }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Build the axum [`Router`].  Call [`start()`](Self::start) to bind and
    /// serve.
    pub fn build_app(&self) -> Router {
        let state = AppState::new(self.backend.clone(), self.settings.request_timeout());
        build_router(state)
    }

    /// Bind the server to `{host}:{port}` and serve until the process exits.
    pub async fn start(self) -> std::io::Result<()> {
        let app = self.build_app();
        let addr = self.settings.listen_addr();
        info!(
            addr = %addr,
            backend = self.backend.name(),
            "tablegate gateway starting"
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await
    }
}

/// Router for a prepared [`AppState`].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health_router())
        .merge(records_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
