//! Core types for the job queue system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Minimal representation of a job request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_type: String,
    pub payload: Value,
}

impl JobRequest {
    #[inline]
    pub fn new(job_type: impl Into<String>, payload: Value) -> Self {
        Self {
            job_type: job_type.into(),
            payload,
        }
    }
}

/// Result returned after a job has been enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResult {
    pub job_id: Uuid,
}

/// Status of a job run.
///
/// Runs only ever move forward: `queued -> processing -> completed | failed`,
/// with `queued -> failed` reserved for cancellation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true if this status represents a terminal state.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a run in this status may move to `next`.
    pub const fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Processing)
                | (Self::Queued, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// A record of a job execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub id: Uuid,
    pub job_type: String,
    pub status: JobStatus,
    /// Percentage in `0..=100`; never decreases.
    pub progress: u8,
    pub stage: Option<String>,
    pub payload: Value,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRun {
    /// Create a new queued job run.
    #[inline]
    pub fn new(job_type: impl Into<String>, payload: Value) -> Self {
        Self::with_id(Uuid::new_v4(), job_type, payload)
    }

    /// Create a new queued job run with a specific ID.
    #[inline]
    pub fn with_id(id: Uuid, job_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id,
            job_type: job_type.into(),
            status: JobStatus::Queued,
            progress: 0,
            stage: None,
            payload,
            result: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Move the run to `next`, stamping timestamps as appropriate.
    ///
    /// Returns `false` (and leaves the run untouched) for transitions that would
    /// go backwards.
    #[must_use]
    pub fn transition(&mut self, next: JobStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        let now = Utc::now();
        match next {
            JobStatus::Processing => self.started_at = Some(now),
            JobStatus::Completed => {
                self.progress = 100;
                self.finished_at = Some(now);
            }
            JobStatus::Failed => self.finished_at = Some(now),
            JobStatus::Queued => {}
        }
        self.status = next;
        true
    }

    /// Mark the job as completed with its result.
    #[must_use]
    pub fn complete(&mut self, result: Value) -> bool {
        if self.transition(JobStatus::Completed) {
            self.result = Some(result);
            true
        } else {
            false
        }
    }

    /// Mark the job as failed with an error message.
    #[must_use]
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.transition(JobStatus::Failed) {
            self.error_message = Some(message.into());
            true
        } else {
            false
        }
    }

    /// Record progress; values lower than the current one are ignored.
    pub fn record_progress(&mut self, progress: u8, stage: Option<String>) {
        if self.status.is_terminal() {
            return;
        }
        let progress = progress.min(100);
        if progress >= self.progress {
            self.progress = progress;
            if stage.is_some() {
                self.stage = stage;
            }
        }
    }

    /// Wall-clock processing time for finished runs.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

/// Filter applied when listing or counting runs.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub status: Option<JobStatus>,
    pub job_type: Option<String>,
}

impl RunFilter {
    pub fn matches(&self, run: &JobRun) -> bool {
        self.status.map_or(true, |s| run.status == s)
            && self
                .job_type
                .as_deref()
                .map_or(true, |t| run.job_type == t)
    }
}

/// Aggregate counters over all retained runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub average_duration_ms: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transitions_are_monotonic() {
        use JobStatus::*;
        assert!(Queued.can_transition_to(Processing));
        assert!(Queued.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Queued));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Queued.can_transition_to(Completed));
    }

    #[test]
    fn run_lifecycle_stamps_times() {
        let mut run = JobRun::new("t", json!({}));
        assert_eq!(run.status, JobStatus::Queued);
        assert!(run.transition(JobStatus::Processing));
        assert!(run.started_at.is_some());
        run.record_progress(40, Some("half".into()));
        assert!(run.complete(json!({"ok": true})));
        assert_eq!(run.progress, 100);
        assert!(run.finished_at.is_some());
        assert!(run.duration_ms().is_some());
        // terminal runs cannot be failed afterwards
        assert!(!run.fail("late"));
        assert!(run.error_message.is_none());
    }

    #[test]
    fn progress_never_decreases() {
        let mut run = JobRun::new("t", json!({}));
        assert!(run.transition(JobStatus::Processing));
        run.record_progress(60, Some("optimizing".into()));
        run.record_progress(20, Some("analyzing".into()));
        assert_eq!(run.progress, 60);
        assert_eq!(run.stage.as_deref(), Some("optimizing"));
        run.record_progress(250, None);
        assert_eq!(run.progress, 100);
    }

    #[test]
    fn status_parse_and_display() {
        assert_eq!("Queued".parse::<JobStatus>(), Ok(JobStatus::Queued));
        assert_eq!(JobStatus::Processing.to_string(), "processing");
        assert!("paused".parse::<JobStatus>().is_err());
        assert_eq!(
            serde_json::to_value(JobStatus::Failed).unwrap(),
            json!("failed")
        );
    }
}
