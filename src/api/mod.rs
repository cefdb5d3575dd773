//! REST API module.
//!
//! Every response carries the store revision so the UI can tell when its
//! view is stale.

mod attendance;
mod children;
mod history;

pub use attendance::*;
pub use children::*;
pub use history::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::store::AttendanceStore;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Wrap an operation's outcome in the envelope, stamped with the revision
/// the store holds after the operation.
pub async fn respond<T: Serialize>(
    store: &AttendanceStore,
    result: Result<T, AppError>,
) -> ApiResult<T> {
    let revision_id = store.revision().await;
    match result {
        Ok(data) => Ok(ApiResponse::new(data, revision_id)),
        Err(error) => Err(AppErrorWithRevision { error, revision_id }),
    }
}
