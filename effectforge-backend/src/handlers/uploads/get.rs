use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use serde_json::Value;

use crate::handlers::utils::path_uuid;
use crate::{error::ApiError, state::AppState};

/// GET /uploads/{uploadId}
pub async fn get(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let id = path_uuid(&path, "uploadId")?;
    match state.uploads.get(id).await? {
        Some(upload) => Ok(Json(serde_json::to_value(&upload)?)),
        None => Err(ApiError::not_found("upload not found")),
    }
}
