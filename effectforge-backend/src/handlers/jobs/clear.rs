use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;
use serde_json::{json, Value};

use crate::{error::ApiError, state::AppState};

/// DELETE /jobs
/// Drop completed and failed runs from the history.
pub async fn clear_runs(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let cleared = state.job_queue.clear_finished().await;
    tracing::info!(cleared, "finished job runs cleared");
    Ok(Json(json!({ "cleared": cleared })))
}
