//! Job queue used by the EffectForge backend.
//!
//! Runs live in memory. Enqueued run ids are handed to a fixed pool of worker
//! tasks over a channel, so the worker count is the concurrency limit. Every
//! run moves monotonically through `queued -> processing -> completed | failed`
//! and executors can report progress while they work.
//!
//! # Architecture
//!
//! - [`JobQueueClient`] - The main interface for enqueuing and tracking jobs
//! - [`WorkerPool`] - Handle to the worker tasks processing queued runs
//! - [`JobExecutor`] - Trait for implementing job handlers
//! - [`JobContext`] - Per-run handle used to report progress
//! - [`JobRun`] - A record of a job execution
//!
//! # Example
//!
//! ```rust,no_run
//! use effectforge_job_queue::{async_trait, JobContext, JobExecutor, JobQueueClient, JobQueueError, JobRequest};
//! use serde_json::{json, Value};
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl JobExecutor for Shout {
//!     fn job_type(&self) -> &str {
//!         "shout"
//!     }
//!
//!     async fn execute(&self, ctx: JobContext, payload: Value) -> Result<Value, JobQueueError> {
//!         ctx.report(50, "shouting").await;
//!         let text = payload["text"].as_str().unwrap_or_default();
//!         Ok(json!(text.to_uppercase()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = JobQueueClient::new();
//!     client.register_executor(Shout).await;
//!     let pool = client.start_workers(2);
//!
//!     let result = client
//!         .enqueue(JobRequest::new("shout", json!({ "text": "hello" })))
//!         .await
//!         .unwrap();
//!     println!("Enqueued job: {}", result.job_id);
//!
//!     pool.shutdown().await;
//! }
//! ```

mod client;
mod error;
mod executor;
mod state;
mod types;

pub use client::{JobQueueClient, WorkerPool};
pub use error::JobQueueError;
pub use executor::{JobContext, JobExecutor};
pub use types::{EnqueueResult, JobRequest, JobRun, JobStatus, QueueStats, RunFilter};

// Re-export async_trait for convenience when implementing JobExecutor
pub use async_trait::async_trait;
