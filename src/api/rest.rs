pub mod employee_controller;
pub mod manager_controller;
pub mod session_controller;
pub mod terminal_controller;

use crate::config::ApiConfig;
use crate::db::models::record_models::AttendanceRecord;
use crate::error::Error;
use crate::messaging::KioskEvents;
use crate::services::scan::{ScanTerminal, TerminalStatus};
use crate::state::{SharedKioskState, ViewState};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub kiosk: SharedKioskState,
    pub terminal: Arc<ScanTerminal>,
    pub events: KioskEvents,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: status.as_u16(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "No active session")
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::DeviceUnavailable(_) | Error::AnnotationUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Api(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::Capture(_) | Error::AnnotationFailed(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err.to_string())
    }
}

/// Implement IntoResponse for ApiError
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(self);
        (status, body).into_response()
    }
}

/// All API routes, without static files or CORS
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/view", get(get_view).put(set_view))
        .route("/api/records", get(get_records))
        .route("/api/events", get(super::websocket::handle_ws_upgrade))
        .nest("/api/terminal", terminal_controller::create_router())
        .nest("/api/session", session_controller::create_router())
        .nest("/api/me", employee_controller::create_router())
        .nest("/api/manager", manager_controller::create_router())
        .with_state(state)
}

pub struct RestApi {
    config: ApiConfig,
    state: AppState,
}

impl RestApi {
    pub fn new(config: &ApiConfig, state: AppState) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            state,
        })
    }

    pub async fn run(&self) -> Result<()> {
        // Create a CORS layer that allows all origins and preflight requests
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(false)
            .max_age(Duration::from_secs(3600));

        let app = build_router(self.state.clone())
            // Serve the front-end from the static directory
            .fallback_service(ServeDir::new(&self.config.static_dir))
            .layer(cors);

        let addr = self.config.address.clone() + ":" + &self.config.port.to_string();
        let addr: SocketAddr = addr.parse()?;

        info!("API server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;

        axum::Server::from_tcp(listener.into_std()?)?
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    records: usize,
    camera_active: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let records = state.kiosk.read().await.record_count();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        records,
        camera_active: state.terminal.is_camera_active().await,
    })
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ViewRequest {
    pub view: ViewState,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub view: ViewState,
    pub terminal: TerminalStatus,
}

async fn get_view(State(state): State<AppState>) -> Json<ViewResponse> {
    let view = state.kiosk.read().await.view();
    Json(ViewResponse {
        view,
        terminal: state.terminal.status().await,
    })
}

/// Switch views. The camera follows the view: held on the terminal,
/// released everywhere else. A camera failure shows up in the terminal
/// status, not as an error of the navigation.
async fn set_view(
    State(state): State<AppState>,
    Json(request): Json<ViewRequest>,
) -> Json<ViewResponse> {
    let previous = state.kiosk.write().await.navigate(request.view);

    if let Err(e) = state.terminal.sync_with_view().await {
        info!("Terminal opened without camera: {}", e);
    }

    if previous != request.view {
        info!("View changed from {:?} to {:?}", previous, request.view);
        state.events.view_changed(request.view).await;
    }

    Json(ViewResponse {
        view: request.view,
        terminal: state.terminal.status().await,
    })
}

/// Every record, newest first
async fn get_records(State(state): State<AppState>) -> Json<Vec<AttendanceRecord>> {
    Json(state.kiosk.read().await.all_records())
}
