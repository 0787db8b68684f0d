//! Session control endpoints.
//!
//! Start/stop are forwarded to the service loop over the command channel and
//! answered through a oneshot reply, so the response carries the real
//! outcome. Status only reads the shared handle and never transitions.

use crate::session::SessionStatusHandle;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// Outcome of a start/stop command, as reported by the session machine.
#[derive(Debug)]
pub struct CommandReply {
    pub success: bool,
    pub message: String,
}

pub enum ApiCommand {
    StartSession { reply: oneshot::Sender<CommandReply> },
    StopSession { reply: oneshot::Sender<CommandReply> },
}

#[derive(Clone)]
pub struct SessionRouteState {
    pub tx: mpsc::Sender<ApiCommand>,
    pub status: SessionStatusHandle,
}

pub fn router(state: SessionRouteState) -> Router {
    Router::new()
        .route("/start", post(start_session))
        .route("/stop", post(stop_session))
        .route("/status", get(session_status))
        .with_state(state)
}

async fn start_session(
    State(state): State<SessionRouteState>,
) -> Result<Json<Value>, StatusCode> {
    info!("Session start command received via API");

    let reply = send_command(&state, |reply| ApiCommand::StartSession { reply }).await?;
    let status = state.status.get().await;

    Ok(Json(json!({
        "success": reply.success,
        "message": reply.message,
        "phase": status.phase.as_str(),
    })))
}

async fn stop_session(State(state): State<SessionRouteState>) -> Result<Json<Value>, StatusCode> {
    info!("Session stop command received via API");

    let reply = send_command(&state, |reply| ApiCommand::StopSession { reply }).await?;
    let status = state.status.get().await;

    Ok(Json(json!({
        "success": reply.success,
        "message": reply.message,
        "phase": status.phase.as_str(),
        "transcript_path": status
            .transcript_path
            .map(|p| p.to_string_lossy().to_string()),
        "summary_path": status.summary_path.map(|p| p.to_string_lossy().to_string()),
    })))
}

async fn session_status(State(state): State<SessionRouteState>) -> Json<Value> {
    let status = state.status.get().await;

    let message = match status.recording_seconds() {
        Some(seconds) => format!("{} for {}s", status.phase.as_str(), seconds),
        None => format!(
            "{} for {}s",
            status.phase.as_str(),
            status.seconds_in_phase()
        ),
    };

    Json(json!({
        "success": true,
        "message": message,
        "phase": status.phase.as_str(),
        "seconds_in_phase": status.seconds_in_phase(),
        "recording_seconds": status.recording_seconds(),
        "last_error": status.last_error,
        "transcript_path": status
            .transcript_path
            .map(|p| p.to_string_lossy().to_string()),
        "summary_path": status.summary_path.map(|p| p.to_string_lossy().to_string()),
    }))
}

async fn send_command<F>(
    state: &SessionRouteState,
    build: F,
) -> Result<CommandReply, StatusCode>
where
    F: FnOnce(oneshot::Sender<CommandReply>) -> ApiCommand,
{
    let (reply_tx, reply_rx) = oneshot::channel();

    if let Err(e) = state.tx.send(build(reply_tx)).await {
        error!("Failed to send session command: {}", e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    reply_rx.await.map_err(|e| {
        error!("Session command reply dropped: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
