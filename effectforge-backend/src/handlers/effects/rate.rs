use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use serde_json::Value;

use crate::handlers::effects::dto::RateEffectDto;
use crate::handlers::utils::{parse_body, path_uuid};
use crate::{error::ApiError, state::AppState};

/// POST /effects/{effectId}/rate
pub async fn rate(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let id = path_uuid(&path, "effectId")?;
    let dto: RateEffectDto = parse_body(body)?;
    let score = dto.validate()?;

    let effect = state.effects.rate(id, score).await?;
    tracing::debug!(effect_id = %id, score, rating = effect.rating, "effect rated");
    Ok(Json(serde_json::to_value(&effect)?))
}
