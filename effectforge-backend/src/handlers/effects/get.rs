use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use serde_json::Value;

use crate::handlers::utils::path_uuid;
use crate::{error::ApiError, state::AppState};

/// GET /effects/{effectId}
pub async fn get(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let id = path_uuid(&path, "effectId")?;
    match state.effects.get(id).await? {
        Some(effect) => Ok(Json(serde_json::to_value(&effect)?)),
        None => Err(ApiError::not_found("effect not found")),
    }
}
