use crate::api::rest::{AppState, ApiError, ApiResult};
use crate::db::models::employee_models::{Employee, LoginCredentials};
use crate::error::Error;
use crate::security::{Session, INVALID_LOGIN_HINT};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use log::warn;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub session: Option<Session>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// Create session controller router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Login against the roster; 401 carries the demo hint
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginCredentials>,
) -> ApiResult<Json<Employee>> {
    let result = state.kiosk.write().await.login(&credentials);
    match result {
        Ok(employee) => {
            state.events.session_opened(&employee).await;
            Ok(Json(employee))
        }
        Err(Error::InvalidCredentials) => {
            warn!("Rejected login for {}", credentials.id);
            Err(ApiError::new(StatusCode::UNAUTHORIZED, INVALID_LOGIN_HINT))
        }
        Err(e) => Err(e.into()),
    }
}

/// Clear the session. Succeeds whether or not one was open.
pub async fn logout(State(state): State<AppState>) -> Json<LogoutResponse> {
    let closed = state.kiosk.write().await.logout();
    if let Some(session) = &closed {
        state.events.session_closed(session.employee_id()).await;
    }
    Json(LogoutResponse {
        logged_out: closed.is_some(),
    })
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.kiosk.read().await.session().cloned();
    Json(SessionResponse {
        authenticated: session.is_some(),
        session,
    })
}
