use crate::api::rest::{AppState, ApiResult};
use crate::services::scan::{ScanOutcome, TerminalStatus};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use serde::Serialize;

/// Response for a scan request
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub outcome: ScanOutcome,
    pub terminal: TerminalStatus,
}

/// Create terminal controller router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/open", post(open_terminal))
        .route("/close", post(close_terminal))
        .route("/status", get(get_status))
        .route("/scan", post(start_scan))
}

/// Acquire the camera. 403 when access is denied, 503 when unavailable.
pub async fn open_terminal(State(state): State<AppState>) -> ApiResult<Json<TerminalStatus>> {
    let status = state.terminal.open().await?;
    Ok(Json(status))
}

pub async fn close_terminal(State(state): State<AppState>) -> Json<TerminalStatus> {
    if state.terminal.close().await {
        info!("Terminal closed, camera released");
    }
    Json(state.terminal.status().await)
}

pub async fn get_status(State(state): State<AppState>) -> Json<TerminalStatus> {
    Json(state.terminal.status().await)
}

/// 202 when a scan starts; 409 when it is ignored
pub async fn start_scan(State(state): State<AppState>) -> (StatusCode, Json<ScanResponse>) {
    let outcome = state.terminal.request_scan().await;
    let code = match outcome {
        ScanOutcome::Started => StatusCode::ACCEPTED,
        ScanOutcome::AlreadyScanning
        | ScanOutcome::CaptureInactive
        | ScanOutcome::ResultShowing => StatusCode::CONFLICT,
    };

    let terminal = state.terminal.status().await;
    (code, Json(ScanResponse { outcome, terminal }))
}
