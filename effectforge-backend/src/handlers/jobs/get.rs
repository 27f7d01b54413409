use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::Value;

use crate::handlers::utils::{job_to_payload, path_uuid};
use crate::{error::ApiError, state::AppState};

/// GET /jobs/{jobId}
pub async fn get_run(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let id = path_uuid(&path, "jobId")?;
    let run = state
        .job_queue
        .get_run(id)
        .await
        .ok_or_else(|| ApiError::not_found("job not found"))?;
    Ok(Json(job_to_payload(&run)))
}
