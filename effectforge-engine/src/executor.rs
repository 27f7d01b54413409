//! Job executor that synthesizes an effect and stores it.

use std::sync::Arc;
use std::time::Duration;

use effectforge_job_queue::{async_trait, JobContext, JobExecutor, JobQueueError};
use effectforge_store::{EffectRepository, StoreError, UploadRepository};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::job_types;
use crate::orchestrator::{Orchestrator, SynthesisRequest};

/// Payload of an `effect.synthesize` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisPayload {
    #[serde(flatten)]
    pub request: SynthesisRequest,
    /// Set when the job was created for an entry of a batch upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadEntry>,
}

/// The upload entry a job reports its outcome to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEntry {
    pub upload_id: Uuid,
    /// 1-based position in the uploaded file.
    pub entry: usize,
}

impl UploadEntry {
    /// Read the entry back out of a job payload.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        payload
            .get("upload")
            .and_then(|v| Self::deserialize(v).ok())
    }
}

impl SynthesisPayload {
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Executor for `effect.synthesize` jobs.
///
/// Reports progress after each stage: analyzing 20, deciding 40, optimizing
/// 60, generating 80, storing 95. The job result is
/// `{ effectId, name, effectType }`.
pub struct EffectSynthesisExecutor {
    orchestrator: Orchestrator,
    effects: Arc<dyn EffectRepository>,
    uploads: Arc<dyn UploadRepository>,
    stage_delay: Duration,
}

impl EffectSynthesisExecutor {
    pub fn new(
        orchestrator: Orchestrator,
        effects: Arc<dyn EffectRepository>,
        uploads: Arc<dyn UploadRepository>,
        stage_delay: Duration,
    ) -> Self {
        Self {
            orchestrator,
            effects,
            uploads,
            stage_delay,
        }
    }

    async fn pause(&self) {
        if !self.stage_delay.is_zero() {
            tokio::time::sleep(self.stage_delay).await;
        }
    }

    async fn run(&self, ctx: &JobContext, request: SynthesisRequest) -> Result<Value, EngineError> {
        ctx.report(20, "analyzing").await;
        let analysis = self.orchestrator.analyze(&request.description)?;
        self.pause().await;

        ctx.report(40, "deciding").await;
        let plan = self.orchestrator.plan(
            &analysis,
            request.platform,
            request.options.name.as_deref(),
        );
        self.pause().await;

        ctx.report(60, "optimizing").await;
        let parameters = self.orchestrator.optimize(&plan, &analysis);
        self.pause().await;

        ctx.report(80, "generating").await;
        let code = self.orchestrator.generate(&plan, &parameters, &analysis)?;
        self.pause().await;

        ctx.report(95, "storing").await;
        let synthesis = self
            .orchestrator
            .assemble(analysis, plan, parameters, code, &request.options);
        let effect = self
            .effects
            .insert(synthesis.into_new_effect(Some(ctx.job_id())))
            .await?;

        info!(
            job_id = %ctx.job_id(),
            effect_id = %effect.id,
            effect_type = %effect.effect_type,
            "effect stored"
        );
        Ok(json!({
            "effectId": effect.id,
            "name": effect.name,
            "effectType": effect.effect_type,
        }))
    }

    async fn report_to_upload(&self, target: UploadEntry, outcome: Result<(), String>) {
        let UploadEntry { upload_id, entry } = target;
        match self.uploads.record_outcome(upload_id, entry, outcome).await {
            Ok(upload) => debug!(
                upload_id = %upload_id,
                entry,
                processed = upload.processed,
                total = upload.total,
                "upload progress"
            ),
            Err(StoreError::InvalidTransition(_)) => {
                warn!(upload_id = %upload_id, entry, "upload already finished; outcome dropped")
            }
            Err(e) => warn!(upload_id = %upload_id, error = %e, "failed to record upload outcome"),
        }
    }
}

#[async_trait]
impl JobExecutor for EffectSynthesisExecutor {
    fn job_type(&self) -> &str {
        job_types::EFFECT_SYNTHESIZE
    }

    async fn execute(&self, ctx: JobContext, payload: Value) -> Result<Value, JobQueueError> {
        let payload: SynthesisPayload = serde_json::from_value(payload).map_err(|e| {
            JobQueueError::ExecutionFailed(EngineError::InvalidPayload(e.to_string()).to_string())
        })?;

        debug!(
            job_id = %ctx.job_id(),
            platform = %payload.request.platform,
            "executing effect.synthesize job"
        );

        let upload = payload.upload;
        let outcome = self.run(&ctx, payload.request).await;

        if let Some(target) = upload {
            let report = outcome.as_ref().map(|_| ()).map_err(|e| e.to_string());
            self.report_to_upload(target, report).await;
        }

        outcome.map_err(|e| JobQueueError::ExecutionFailed(e.to_string()))
    }
}
