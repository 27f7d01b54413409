use std::sync::Arc;

use axum::extract::{Extension, Json};
use serde_json::{json, Value};

use crate::handlers::effects::dto::GenerateEffectDto;
use crate::handlers::utils::parse_body;
use crate::{error::ApiError, state::AppState};

/// POST /effects/preview
/// Run the pipeline inline and return every stage's output. Nothing is stored.
pub async fn preview(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let dto: GenerateEffectDto = parse_body(body)?;
    let request = dto.validate()?;
    let synthesis = state.orchestrator.synthesize(&request)?;

    Ok(Json(json!({
        "analysis": synthesis.analysis,
        "plan": synthesis.plan,
        "parameters": synthesis.parameters,
        "code": synthesis.code,
        "tags": synthesis.tags(),
    })))
}
