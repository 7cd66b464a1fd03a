use crate::api::rest::{AppState, ApiError, ApiResult};
use crate::db::models::record_models::AttendanceRecord;
use crate::services::history::EmployeeDashboard;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;

/// Create employee controller router. Every route needs a session.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/history", get(get_history))
        .route("/latest", get(get_latest))
}

pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Json<EmployeeDashboard>> {
    let dashboard = state
        .kiosk
        .read()
        .await
        .employee_dashboard()
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Json(dashboard))
}

/// History of the logged-in employee, oldest first
pub async fn get_history(State(state): State<AppState>) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    let kiosk = state.kiosk.read().await;
    if kiosk.session().is_none() {
        return Err(ApiError::unauthorized());
    }
    Ok(Json(kiosk.employee_history()))
}

/// Most recent record, `null` when the employee has none yet
pub async fn get_latest(
    State(state): State<AppState>,
) -> ApiResult<Json<Option<AttendanceRecord>>> {
    let kiosk = state.kiosk.read().await;
    if kiosk.session().is_none() {
        return Err(ApiError::unauthorized());
    }
    Ok(Json(kiosk.latest_employee_record()))
}
