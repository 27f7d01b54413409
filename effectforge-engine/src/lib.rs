//! Effect synthesis for the EffectForge backend.
//!
//! A description passes through four deterministic stages:
//!
//! 1. [`nlp::NlpProcessor`] matches keywords against a concept table and
//!    pulls out colors, modifiers, counts and quoted text.
//! 2. [`decision::DecisionEngine`] scores every effect type and picks one.
//! 3. [`optimizer::ParameterOptimizer`] derives animation parameters.
//! 4. [`codegen::JsGenerator`] fills the Canvas (or React) templates.
//!
//! [`Orchestrator`] chains them. [`EffectSynthesisExecutor`] runs the same
//! chain as a job and stores the result.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use effectforge_engine::{register_all_executors, ExecutorDeps};
//! use effectforge_job_queue::JobQueueClient;
//! use effectforge_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let client = JobQueueClient::new();
//!     register_all_executors(
//!         &client,
//!         ExecutorDeps {
//!             effects: store.clone(),
//!             uploads: store,
//!             stage_delay: Duration::from_millis(150),
//!         },
//!     )
//!     .await;
//! }
//! ```

pub mod codegen;
pub mod decision;
mod error;
mod executor;
pub mod nlp;
pub mod optimizer;
mod orchestrator;
pub mod samples;
pub mod template;

use std::sync::Arc;
use std::time::Duration;

pub use error::{EngineError, TemplateError};
pub use executor::{EffectSynthesisExecutor, SynthesisPayload, UploadEntry};
pub use orchestrator::{Orchestrator, Synthesis, SynthesisOptions, SynthesisRequest};

use effectforge_job_queue::JobQueueClient;
use effectforge_store::{EffectRepository, UploadRepository};

/// What the executors need from the rest of the application.
#[derive(Clone)]
pub struct ExecutorDeps {
    pub effects: Arc<dyn EffectRepository>,
    pub uploads: Arc<dyn UploadRepository>,
    /// Pause between pipeline stages so progress is observable.
    pub stage_delay: Duration,
}

/// Register all available job executors with the job queue client.
pub async fn register_all_executors(client: &JobQueueClient, deps: ExecutorDeps) {
    client
        .register_executor(EffectSynthesisExecutor::new(
            Orchestrator::new(),
            deps.effects,
            deps.uploads,
            deps.stage_delay,
        ))
        .await;
}

/// Job type constants for type-safe job references.
pub mod job_types {
    pub const EFFECT_SYNTHESIZE: &str = "effect.synthesize";
}
