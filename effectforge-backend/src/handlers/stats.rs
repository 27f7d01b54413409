use std::sync::Arc;

use axum::extract::{Extension, Json};
use effectforge_store::UploadStatus;
use serde_json::{json, Value};

use crate::{error::ApiError, state::AppState};

/// GET /stats
/// Counters from the queue, the library and the uploads.
pub async fn stats(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let queue = state.job_queue.stats().await;
    let library = state.effects.summary().await?;
    let uploads = state.uploads.list().await?;

    let count = |status: UploadStatus| uploads.iter().filter(|u| u.status == status).count();

    Ok(Json(json!({
        "uptimeSeconds": state.uptime().as_secs(),
        "workers": state.workers(),
        "queue": queue,
        "library": library,
        "uploads": {
            "total": uploads.len(),
            "pending": count(UploadStatus::Pending),
            "processing": count(UploadStatus::Processing),
            "completed": count(UploadStatus::Completed),
            "failed": count(UploadStatus::Failed),
        },
    })))
}
