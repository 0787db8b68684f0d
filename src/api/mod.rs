//! REST API server for minuter.
//!
//! Provides HTTP endpoints for:
//! - Starting a session (POST /start)
//! - Stopping a session (POST /stop)
//! - Getting session status (GET /status)

pub mod routes;

use crate::session::SessionStatusHandle;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::session::{ApiCommand, CommandReply, SessionRouteState};

pub struct ApiServer {
    port: u16,
    session_state: SessionRouteState,
}

impl ApiServer {
    pub fn new(
        tx: tokio::sync::mpsc::Sender<ApiCommand>,
        status: SessionStatusHandle,
        port: u16,
    ) -> Self {
        Self {
            port,
            session_state: SessionRouteState { tx, status },
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(service_info))
            .route("/version", get(version))
            .merge(routes::session::router(self.session_state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /         - Service info");
        info!("  POST /start    - Start a capture session");
        info!("  POST /stop     - Stop and process the session");
        info!("  GET  /status   - Get session status");
        info!("  GET  /version  - Get version info");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "minuter",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "minuter"
    }))
}
