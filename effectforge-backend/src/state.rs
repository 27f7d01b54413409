use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use effectforge_config::Config;
use effectforge_engine::{register_all_executors, ExecutorDeps, Orchestrator};
use effectforge_job_queue::{JobQueueClient, WorkerPool};
use effectforge_store::{EffectRepository, MemoryStore, UploadRepository};

/// Bounds applied to batch uploads.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_entries: usize,
    pub max_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_bytes: 256 * 1024,
        }
    }
}

/// Shared application state passed to every route handler.
pub struct AppState {
    pub effects: Arc<dyn EffectRepository>,
    pub uploads: Arc<dyn UploadRepository>,
    pub job_queue: JobQueueClient,
    pub orchestrator: Orchestrator,
    pub limits: UploadLimits,
    started_at: Instant,
    workers: AtomicUsize,
}

impl AppState {
    /// Build a state container from its constituent parts.
    ///
    /// Executors must already be registered on `job_queue`.
    pub fn new(
        effects: Arc<dyn EffectRepository>,
        uploads: Arc<dyn UploadRepository>,
        job_queue: JobQueueClient,
        limits: UploadLimits,
    ) -> Self {
        Self {
            effects,
            uploads,
            job_queue,
            orchestrator: Orchestrator::new(),
            limits,
            started_at: Instant::now(),
            workers: AtomicUsize::new(0),
        }
    }

    /// Wire an in-memory store and a job queue with every executor registered.
    pub async fn from_config(cfg: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let job_queue = JobQueueClient::with_capacity(cfg.queue.max_job_runs);
        register_all_executors(
            &job_queue,
            ExecutorDeps {
                effects: store.clone(),
                uploads: store.clone(),
                stage_delay: Duration::from_millis(cfg.queue.stage_delay_ms),
            },
        )
        .await;
        Self::new(
            store.clone(),
            store,
            job_queue,
            UploadLimits {
                max_entries: cfg.uploads.max_entries,
                max_bytes: cfg.uploads.max_bytes,
            },
        )
    }

    /// Start the worker pool and remember its size for `/ready` and `/stats`.
    pub fn start_workers(&self, workers: usize) -> WorkerPool {
        let pool = self.job_queue.start_workers(workers);
        self.workers.store(pool.size(), Ordering::Relaxed);
        pool
    }

    /// Number of running workers; zero until [`AppState::start_workers`] is called.
    pub fn workers(&self) -> usize {
        self.workers.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
