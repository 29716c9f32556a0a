use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::sync::{LoopState, SharedStatus, StopMarker, TickRecord};

/// Shared with the sync loop: the status snapshot and the stop marker.
#[derive(Clone)]
pub struct ControlState {
    pub status: SharedStatus,
    pub stop: StopMarker,
}

pub fn routes() -> Router<ControlState> {
    Router::new()
        .route("/stop", post(stop_sync))
        .route("/status", get(get_status))
}

pub fn app(state: ControlState) -> Router {
    routes().layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve the control endpoints until the process exits.
pub async fn serve(port: u16, state: ControlState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Control server listening on http://{}", addr);
    axum::serve(listener, app(state)).await
}

#[derive(Serialize)]
struct StatusResponse {
    state: LoopState,
    ticks: u64,
    #[serde(rename = "lastOutcome")]
    last_outcome: Option<String>,
    #[serde(rename = "lastExitCode")]
    last_exit_code: Option<i32>,
    #[serde(rename = "lastTickAt")]
    last_tick_at: Option<String>,
    history: Vec<TickRecord>,
}

async fn get_status(State(state): State<ControlState>) -> Json<StatusResponse> {
    let status = state.status.read();

    Json(StatusResponse {
        state: status.state,
        ticks: status.ticks,
        last_outcome: status.last_outcome.clone(),
        last_exit_code: status.last_exit_code,
        last_tick_at: status.last_tick_at.map(|t| t.to_rfc3339()),
        history: status.history.recent(Some(20)),
    })
}

async fn stop_sync(State(state): State<ControlState>) -> (StatusCode, Json<serde_json::Value>) {
    // The loop only checks the marker between ticks; a running transfer
    // finishes first.
    match state.stop.raise().await {
        Ok(()) => {
            {
                let mut status = state.status.write();
                if status.state == LoopState::Running {
                    status.state = LoopState::Stopping;
                }
            }
            (StatusCode::OK, Json(json!({"status": "stopping"})))
        }
        Err(e) => {
            error!("Failed to raise stop marker: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
        }
    }
}
