//! Storage interfaces. Handlers and executors only see these traits, so the
//! in-memory implementation can be swapped for a database later.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Effect, NewEffect, NewUpload, Upload};
use crate::query::{CleanupPolicy, EffectPage, EffectQuery, LibrarySummary};

#[async_trait]
pub trait EffectRepository: Send + Sync {
    /// Store a new effect, assigning its id, code hash and timestamps.
    async fn insert(&self, effect: NewEffect) -> Result<Effect, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Effect>, StoreError>;

    async fn list(&self, query: &EffectQuery) -> Result<EffectPage, StoreError>;

    /// Fold a 1-5 score into the running average.
    async fn rate(&self, id: Uuid, score: u8) -> Result<Effect, StoreError>;

    async fn record_download(&self, id: Uuid) -> Result<Effect, StoreError>;

    /// Remove the effects matching `policy` and return their ids.
    async fn cleanup(&self, policy: &CleanupPolicy) -> Result<Vec<Uuid>, StoreError>;

    async fn summary(&self) -> Result<LibrarySummary, StoreError>;
}

#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn create(&self, upload: NewUpload) -> Result<Upload, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Upload>, StoreError>;

    /// All uploads, newest first.
    async fn list(&self) -> Result<Vec<Upload>, StoreError>;

    /// Record the jobs spawned for the upload and mark it processing.
    async fn attach_jobs(&self, id: Uuid, job_ids: Vec<Uuid>) -> Result<Upload, StoreError>;

    /// Count an entry that was rejected before a job was created for it.
    async fn record_entry_failure(
        &self,
        id: Uuid,
        entry: usize,
        message: String,
    ) -> Result<Upload, StoreError>;

    /// Count the outcome of the job created for `entry`. A second outcome for
    /// the same entry replaces the first.
    async fn record_outcome(
        &self,
        id: Uuid,
        entry: usize,
        outcome: Result<(), String>,
    ) -> Result<Upload, StoreError>;

    /// Uncount `entry` before its job is retried, so the upload waits for the
    /// retry. Fails with `InvalidTransition` once the upload has finished.
    async fn reopen_entry(&self, id: Uuid, entry: usize) -> Result<Upload, StoreError>;
}
