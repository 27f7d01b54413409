use std::sync::Arc;

use axum::extract::{Extension, Json};
use serde_json::{json, Value};

use crate::{error::ApiError, state::AppState};

/// GET /uploads
/// Every upload, newest first.
pub async fn list(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let uploads = state.uploads.list().await?;
    Ok(Json(json!({
        "items": uploads,
        "total": uploads.len(),
    })))
}
