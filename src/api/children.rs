//! Roster and check-in/check-out endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use super::{respond, ApiResult};
use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, CheckInRequest, CheckOutRequest, ChildEntry, ListQuery,
    Page, StatusCounts,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CountsQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub child_id: String,
    pub status: AttendanceStatus,
}

/// GET /api/children - Search, filter and page the roster.
pub async fn list_children(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Page<ChildEntry>> {
    let result = match query {
        Ok(Query(query)) => Ok(state.store.list(&query).await),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    };
    respond(&state.store, result).await
}

/// GET /api/children/counts - Per-status counts for the filter badges.
pub async fn children_counts(
    State(state): State<AppState>,
    Query(query): Query<CountsQuery>,
) -> ApiResult<StatusCounts> {
    let counts = state.store.status_counts(query.search.as_deref()).await;
    respond(&state.store, Ok(counts)).await
}

/// GET /api/children/{id} - A child with its status and today's record.
pub async fn get_child(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ChildEntry> {
    let result = state.store.child_entry(&id).await;
    respond(&state.store, result).await
}

/// GET /api/children/{id}/status
pub async fn get_child_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusView> {
    let status = state.store.status_of(&id).await;
    respond(
        &state.store,
        Ok(StatusView {
            child_id: id,
            status,
        }),
    )
    .await
}

/// GET /api/children/{id}/record
pub async fn get_child_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AttendanceRecord> {
    let result = state
        .store
        .record_of(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No attendance record for child {} today", id)));
    respond(&state.store, result).await
}

/// POST /api/children/{id}/check-in
pub async fn check_in_child(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CheckInRequest>, JsonRejection>,
) -> ApiResult<AttendanceRecord> {
    let result = match body {
        Ok(Json(request)) => state.store.check_in(&id, &request.dropped_off_by).await,
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    };
    respond(&state.store, result).await
}

/// POST /api/children/{id}/check-out
pub async fn check_out_child(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CheckOutRequest>, JsonRejection>,
) -> ApiResult<AttendanceRecord> {
    let result = match body {
        Ok(Json(request)) => state.store.check_out(&id, &request.picked_up_by).await,
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    };
    respond(&state.store, result).await
}
