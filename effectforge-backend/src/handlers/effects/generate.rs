use std::sync::Arc;

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use effectforge_engine::{job_types, SynthesisPayload};
use effectforge_job_queue::JobRequest;
use serde_json::{json, Value};

use crate::handlers::effects::dto::GenerateEffectDto;
use crate::handlers::utils::parse_body;
use crate::{error::ApiError, state::AppState};

/// POST /effects/generate
/// Queue a synthesis job for one description.
pub async fn generate(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let dto: GenerateEffectDto = parse_body(body)?;
    let request = dto.validate()?;

    let payload = SynthesisPayload {
        request,
        upload: None,
    };
    let enqueued = state
        .job_queue
        .enqueue(JobRequest::new(
            job_types::EFFECT_SYNTHESIZE,
            payload.into_value(),
        ))
        .await?;

    tracing::info!(job_id = %enqueued.job_id, "effect generation queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "jobId": enqueued.job_id, "status": "queued" })),
    ))
}
