//! Today's attendance, statistics and roster reload endpoints.

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{respond, ApiResult};
use crate::models::{AttendanceRecord, AttendanceStats};
use crate::store::LoadSummary;
use crate::AppState;

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// GET /api/attendance - Today's records in roster order.
pub async fn list_attendance(State(state): State<AppState>) -> ApiResult<Vec<AttendanceRecord>> {
    let records = state.store.records().await;
    respond(&state.store, Ok(records)).await
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<AttendanceStats> {
    let stats = state.store.stats().await;
    respond(&state.store, Ok(stats)).await
}

/// POST /api/roster/reload - Refetch roster and attendance from the remote sheet.
pub async fn reload_roster(State(state): State<AppState>) -> ApiResult<LoadSummary> {
    let result = state.store.load().await;
    respond(&state.store, result).await
}

/// GET /api/revision
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let info = RevisionInfo {
        revision_id: state.store.revision().await,
        loaded_at: state.store.loaded_at().await,
    };
    respond(&state.store, Ok(info)).await
}
