//! Attendance history endpoint.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{respond, ApiResult};
use crate::models::History;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub date: Option<String>,
}

/// GET /api/history - Past attendance grouped by date, newest first.
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<History> {
    let result = state.store.history(query.date.as_deref()).await;
    respond(&state.store, result).await
}
