use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::Json;
use effectforge_job_queue::{JobStatus, RunFilter};
use serde_json::Value;

use crate::handlers::utils::{job_to_payload, paginated, parse_paging};
use crate::{error::ApiError, state::AppState};

/// GET /jobs
/// List job runs, most recent first, with optional `status` and `jobType` filters.
pub async fn list_runs(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let (page, per_page, offset) = parse_paging(&params)?;

    let status = params
        .get("status")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<JobStatus>().map_err(ApiError::bad_request))
        .transpose()?;
    let job_type = params
        .get("jobType")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let filter = RunFilter { status, job_type };

    let total = state.job_queue.count_runs(&filter).await;
    let runs = state.job_queue.list_runs(&filter, per_page, offset).await;
    let items: Vec<Value> = runs.iter().map(job_to_payload).collect();

    Ok(Json(paginated(items, page, per_page, total)))
}
