use std::sync::Arc;

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use effectforge_engine::{job_types, SynthesisPayload, UploadEntry};
use effectforge_job_queue::JobRequest;
use effectforge_store::NewUpload;
use serde_json::Value;

use crate::handlers::uploads::dto::{describe_issues, CreateUploadDto};
use crate::handlers::utils::parse_body;
use crate::{error::ApiError, state::AppState};

/// POST /uploads
/// Accept a batch of descriptions and queue one synthesis job per valid entry.
/// Invalid entries are recorded on the upload instead of failing the request.
pub async fn create(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let dto: CreateUploadDto = parse_body(body)?;
    let parsed = dto.validate(&state.limits)?;

    let upload = state
        .uploads
        .create(NewUpload {
            filename: parsed.filename,
            size_bytes: parsed.size_bytes,
            total: parsed.entries.len(),
        })
        .await?;
    let upload_id = upload.id;

    let mut job_ids = Vec::new();
    for (index, entry) in parsed.entries.into_iter().enumerate() {
        let position = index + 1;
        let request = entry.and_then(|dto| {
            dto.validate_with_default(parsed.platform)
                .map_err(|issues| describe_issues(&issues))
        });
        let outcome = match request {
            Ok(request) => {
                let payload = SynthesisPayload {
                    request,
                    upload: Some(UploadEntry {
                        upload_id,
                        entry: position,
                    }),
                };
                state
                    .job_queue
                    .enqueue(JobRequest::new(
                        job_types::EFFECT_SYNTHESIZE,
                        payload.into_value(),
                    ))
                    .await
                    .map(|enqueued| enqueued.job_id)
                    .map_err(|e| e.to_string())
            }
            Err(message) => Err(message),
        };
        match outcome {
            Ok(job_id) => job_ids.push(job_id),
            Err(message) => {
                state
                    .uploads
                    .record_entry_failure(upload_id, position, message)
                    .await?;
            }
        }
    }

    let queued = job_ids.len();
    let upload = state.uploads.attach_jobs(upload_id, job_ids).await?;

    tracing::info!(
        %upload_id,
        total = upload.total,
        queued,
        rejected = upload.failed,
        "upload accepted"
    );
    Ok((StatusCode::ACCEPTED, Json(serde_json::to_value(&upload)?)))
}
