//! Job queue client implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::JobQueueError;
use crate::executor::{JobContext, JobExecutor};
use crate::state::{JobQueueState, SharedState};
use crate::types::{EnqueueResult, JobRequest, JobRun, JobStatus, QueueStats, RunFilter};

/// Default number of job runs to keep in memory.
const MAX_JOB_RUNS: usize = 1000;

type ExecutorMap = Arc<RwLock<HashMap<String, Arc<dyn JobExecutor>>>>;

/// Interface for enqueuing jobs and tracking their execution.
///
/// Enqueued run ids travel over an unbounded channel; the receiving end is
/// shared by the tasks started with [`JobQueueClient::start_workers`].
#[derive(Clone)]
pub struct JobQueueClient {
    state: SharedState,
    executors: ExecutorMap,
    sender: mpsc::UnboundedSender<Uuid>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Uuid>>>,
}

impl fmt::Debug for JobQueueClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueueClient")
            .field("state", &"<RwLock<JobQueueState>>")
            .field(
                "executors",
                &"<RwLock<HashMap<String, Arc<dyn JobExecutor>>>>",
            )
            .finish()
    }
}

impl Default for JobQueueClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueueClient {
    pub fn new() -> Self {
        Self::with_capacity(MAX_JOB_RUNS)
    }

    /// Build a client that retains at most `max_runs` finished runs.
    pub fn with_capacity(max_runs: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(RwLock::new(JobQueueState::new(max_runs))),
            executors: Arc::new(RwLock::new(HashMap::new())),
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Register a job executor for a specific job type.
    pub async fn register_executor<E: JobExecutor + 'static>(&self, executor: E) {
        let job_type = executor.job_type().to_owned();
        let mut executors = self.executors.write().await;
        executors.insert(job_type, Arc::new(executor));
    }

    /// Enqueue a job for asynchronous processing.
    pub async fn enqueue(&self, request: JobRequest) -> Result<EnqueueResult, JobQueueError> {
        if !self.executors.read().await.contains_key(&request.job_type) {
            return Err(JobQueueError::UnknownJobType(request.job_type));
        }

        let run = JobRun::new(&request.job_type, request.payload);
        let job_id = run.id;

        self.state.write().await.insert(run);
        self.sender
            .send(job_id)
            .map_err(|_| JobQueueError::Unavailable)?;

        debug!(%job_id, job_type = %request.job_type, "job enqueued");
        Ok(EnqueueResult { job_id })
    }

    /// Spawn `workers` tasks that pull queued runs and execute them.
    ///
    /// The worker count is the upper bound on concurrently processing jobs.
    /// Workers stop when the returned pool is shut down or dropped.
    pub fn start_workers(&self, workers: usize) -> WorkerPool {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = (0..workers.max(1))
            .map(|index| {
                let worker = Worker {
                    index,
                    state: Arc::clone(&self.state),
                    executors: Arc::clone(&self.executors),
                    receiver: Arc::clone(&self.receiver),
                    shutdown: shutdown_rx.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect::<Vec<_>>();
        info!(workers = handles.len(), "job workers started");
        WorkerPool {
            handles,
            shutdown: shutdown_tx,
        }
    }

    /// List job runs, most recent first.
    pub async fn list_runs(&self, filter: &RunFilter, limit: usize, offset: usize) -> Vec<JobRun> {
        let state = self.state.read().await;
        state
            .iter_recent()
            .filter(|r| filter.matches(r))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Get total count of job runs matching `filter`.
    pub async fn count_runs(&self, filter: &RunFilter) -> usize {
        let state = self.state.read().await;
        state.count(filter)
    }

    /// Remove every completed or failed run. Returns the number removed.
    pub async fn clear_finished(&self) -> usize {
        let mut state = self.state.write().await;
        state.clear_finished()
    }

    /// Get a specific job run by ID.
    pub async fn get_run(&self, id: Uuid) -> Option<JobRun> {
        let state = self.state.read().await;
        state.get(&id).cloned()
    }

    /// Cancel a run that has not been picked up yet.
    pub async fn cancel(&self, id: Uuid) -> Result<JobRun, JobQueueError> {
        let mut state = self.state.write().await;
        let run = state.get_mut(&id).ok_or(JobQueueError::NotFound(id))?;
        if run.status != JobStatus::Queued || !run.fail("cancelled") {
            return Err(JobQueueError::InvalidTransition {
                from: run.status,
                to: JobStatus::Failed,
            });
        }
        info!(job_id = %id, "job cancelled");
        let cancelled = run.clone();
        state.trim();
        Ok(cancelled)
    }

    /// Enqueue a fresh run carrying the payload of a failed one.
    pub async fn retry(&self, id: Uuid) -> Result<EnqueueResult, JobQueueError> {
        let run = self.get_run(id).await.ok_or(JobQueueError::NotFound(id))?;
        if run.status != JobStatus::Failed {
            return Err(JobQueueError::InvalidTransition {
                from: run.status,
                to: JobStatus::Queued,
            });
        }
        self.enqueue(JobRequest::new(run.job_type, run.payload))
            .await
    }

    pub async fn stats(&self) -> QueueStats {
        let state = self.state.read().await;
        state.stats()
    }
}

/// Handle to the worker tasks started by [`JobQueueClient::start_workers`].
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Signal every worker to stop and wait for them to exit.
    ///
    /// A job that is mid-execution finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(%e, "job worker exited abnormally");
            }
        }
        info!("job workers stopped");
    }
}

struct Worker {
    index: usize,
    state: SharedState,
    executors: ExecutorMap,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Uuid>>>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            if *self.shutdown.borrow() {
                break;
            }
            let receiver = Arc::clone(&self.receiver);
            let next = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                id = async move { receiver.lock().await.recv().await } => id,
            };
            match next {
                Some(id) => self.process(id).await,
                None => break,
            }
        }
        debug!(worker = self.index, "job worker exiting");
    }

    async fn process(&self, id: Uuid) {
        let (job_type, payload) = {
            let mut state = self.state.write().await;
            let Some(run) = state.get_mut(&id) else {
                debug!(job_id = %id, "run no longer retained; skipping");
                return;
            };
            if !run.transition(JobStatus::Processing) {
                debug!(job_id = %id, status = %run.status, "run not queued; skipping");
                return;
            }
            (run.job_type.clone(), run.payload.clone())
        };

        debug!(worker = self.index, job_id = %id, %job_type, "processing job");

        let executor = self.executors.read().await.get(&job_type).cloned();
        let outcome = match executor {
            None => Err(JobQueueError::UnknownJobType(job_type.clone()).to_string()),
            Some(executor) => {
                let ctx = JobContext::attached(id, Arc::clone(&self.state));
                // Run on its own task so a panicking executor only fails its run.
                let handle = tokio::spawn(async move { executor.execute(ctx, payload).await });
                match handle.await {
                    Ok(Ok(result)) => Ok(result),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(e) if e.is_panic() => Err("job executor panicked".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            }
        };

        let mut state = self.state.write().await;
        let Some(run) = state.get_mut(&id) else {
            return;
        };
        match outcome {
            Ok(result) => {
                if run.complete(result) {
                    info!(job_id = %id, %job_type, duration_ms = ?run.duration_ms(), "job completed");
                }
            }
            Err(message) => {
                warn!(job_id = %id, %job_type, error = %message, "job failed");
                let _ = run.fail(message);
            }
        }
        state.trim();
    }
}
