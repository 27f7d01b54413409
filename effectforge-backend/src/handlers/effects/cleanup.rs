use std::sync::Arc;

use axum::extract::{Extension, Json};
use serde_json::{json, Value};

use crate::handlers::effects::dto::CleanupDto;
use crate::handlers::utils::parse_body;
use crate::{error::ApiError, state::AppState};

/// POST /admin/effects/cleanup
/// Remove effects matching an age and/or rating policy.
pub async fn cleanup(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let dto: CleanupDto = parse_body(body)?;
    let policy = dto.validate()?;

    let ids = state.effects.cleanup(&policy).await?;
    Ok(Json(json!({ "removed": ids.len(), "ids": ids })))
}
