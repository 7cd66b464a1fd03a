use crate::api::rest::{AppState, ApiResult};
use crate::db::models::record_models::AttendanceRecord;
use crate::services::classifier::{ManagerFilter, ManagerSummary};
use crate::state::ManagerView;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for the record table
#[derive(Debug, Deserialize)]
pub struct RecordsParams {
    /// `all` or `risk`; falls back to the stored filter
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FilterRequest {
    pub filter: ManagerFilter,
}

/// Create manager controller router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/records", get(get_records))
        .route("/summary", get(get_summary))
        .route("/view", get(get_view))
        .route("/filter", put(set_filter))
        .route("/select/:id", post(select_record))
        .route("/back", post(back))
}

/// RISK first, newest first within each group
pub async fn get_records(
    State(state): State<AppState>,
    Query(params): Query<RecordsParams>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    let kiosk = state.kiosk.read().await;
    let records = match params.filter {
        Some(filter) => kiosk.manager_records_with(filter.parse()?),
        None => kiosk.manager_records(),
    };
    Ok(Json(records))
}

pub async fn get_summary(State(state): State<AppState>) -> Json<ManagerSummary> {
    Json(state.kiosk.read().await.manager_summary())
}

pub async fn get_view(State(state): State<AppState>) -> Json<ManagerView> {
    Json(state.kiosk.read().await.manager_view().clone())
}

pub async fn set_filter(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Json<ManagerView> {
    let view = {
        let mut kiosk = state.kiosk.write().await;
        kiosk.set_filter(request.filter);
        kiosk.manager_view().clone()
    };
    state.events.filter_changed(request.filter).await;
    Json(view)
}

/// LIST -> DETAIL; 404 for an unknown record
pub async fn select_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AttendanceRecord>> {
    let record = state.kiosk.write().await.select_record(&id)?.clone();
    Ok(Json(record))
}

/// DETAIL -> LIST
pub async fn back(State(state): State<AppState>) -> Json<ManagerView> {
    let mut kiosk = state.kiosk.write().await;
    kiosk.back();
    Json(kiosk.manager_view().clone())
}
