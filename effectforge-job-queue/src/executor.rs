//! Job executor trait for implementing job handlers.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::JobQueueError;
use crate::state::SharedState;

/// Handle given to an executor for the run it is processing.
///
/// Progress reported through the context is written straight into the run
/// record, so pollers see it immediately.
#[derive(Clone)]
pub struct JobContext {
    job_id: Uuid,
    state: Option<SharedState>,
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("job_id", &self.job_id)
            .field("attached", &self.state.is_some())
            .finish()
    }
}

impl JobContext {
    pub(crate) fn attached(job_id: Uuid, state: SharedState) -> Self {
        Self {
            job_id,
            state: Some(state),
        }
    }

    /// A context that is not backed by a queue; progress reports are dropped.
    ///
    /// Useful for running an executor directly, e.g. in tests.
    pub fn detached(job_id: Uuid) -> Self {
        Self {
            job_id,
            state: None,
        }
    }

    #[inline]
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Report progress (0-100) and the name of the stage being worked on.
    pub async fn report(&self, progress: u8, stage: impl Into<String>) {
        let Some(state) = &self.state else {
            return;
        };
        let mut guard = state.write().await;
        if let Some(run) = guard.get_mut(&self.job_id) {
            run.record_progress(progress, Some(stage.into()));
        }
    }
}

/// Trait for implementing job executors.
///
/// Job executors handle the actual execution of jobs. Each job type should have
/// a corresponding executor implementation.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Returns the job type this executor handles.
    fn job_type(&self) -> &str;

    /// Execute the job with the given payload.
    ///
    /// The returned value is stored as the run's result.
    async fn execute(&self, ctx: JobContext, payload: Value) -> Result<Value, JobQueueError>;
}
