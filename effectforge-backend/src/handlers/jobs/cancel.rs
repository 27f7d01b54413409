use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::Json;
use effectforge_store::StoreError;
use serde_json::Value;

use crate::handlers::utils::{job_to_payload, job_upload_entry, path_uuid};
use crate::{error::ApiError, state::AppState};

/// POST /jobs/{jobId}/cancel
/// Fail a queued run before a worker picks it up. Runs that already started
/// are rejected with 409.
pub async fn cancel(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let id = path_uuid(&path, "jobId")?;
    let run = state.job_queue.cancel(id).await?;

    // the executor never runs, so account for the entry here
    if let Some(target) = job_upload_entry(&run) {
        let upload_id = target.upload_id;
        match state
            .uploads
            .record_outcome(upload_id, target.entry, Err("cancelled".to_string()))
            .await
        {
            Ok(_) | Err(StoreError::InvalidTransition(_)) => {}
            Err(e) => tracing::warn!(%upload_id, error = %e, "failed to record cancelled entry"),
        }
    }

    Ok(Json(job_to_payload(&run)))
}
