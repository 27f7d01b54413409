use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use effectforge_job_queue::JobStatus;
use effectforge_store::StoreError;
use serde_json::{json, Value};

use crate::handlers::utils::{job_upload_entry, path_uuid};
use crate::{error::ApiError, state::AppState};

/// POST /jobs/{jobId}/retry
/// Enqueue the payload of a failed run as a new job.
///
/// A run created for an upload entry can only be retried while the upload is
/// open; the entry is uncounted so the upload waits for the new run.
pub async fn retry(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = path_uuid(&path, "jobId")?;
    let run = state
        .job_queue
        .get_run(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("job run not found: {id}")))?;

    let reopened = match job_upload_entry(&run) {
        Some(target) if run.status == JobStatus::Failed => {
            state
                .uploads
                .reopen_entry(target.upload_id, target.entry)
                .await
                .map_err(|e| match e {
                    StoreError::InvalidTransition(upload_id) => ApiError::conflict(format!(
                        "upload {upload_id} is already finished; its jobs cannot be retried"
                    )),
                    other => other.into(),
                })?;
            Some(target)
        }
        _ => None,
    };

    let enqueued = match state.job_queue.retry(id).await {
        Ok(enqueued) => enqueued,
        Err(e) => {
            // put the earlier failure back so the upload can still finish
            if let Some(target) = reopened {
                let message = run
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "retry failed".to_string());
                if let Err(err) = state
                    .uploads
                    .record_outcome(target.upload_id, target.entry, Err(message))
                    .await
                {
                    tracing::warn!(upload_id = %target.upload_id, error = %err, "failed to restore upload entry");
                }
            }
            return Err(e.into());
        }
    };

    tracing::info!(job_id = %id, new_job_id = %enqueued.job_id, "job retried");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "jobId": enqueued.job_id,
            "retriedFrom": id,
            "status": "queued",
        })),
    ))
}
