//! Run storage shared between the client, its workers and job contexts.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{JobRun, JobStatus, QueueStats, RunFilter};

pub(crate) type SharedState = Arc<RwLock<JobQueueState>>;

/// Internal storage optimized for both iteration and lookup by ID.
#[derive(Debug)]
pub(crate) struct JobQueueState {
    /// Ordered list of job run IDs (oldest first).
    order: VecDeque<Uuid>,
    /// Map from ID to job run for O(1) lookup.
    runs: HashMap<Uuid, JobRun>,
    max_runs: usize,
}

impl JobQueueState {
    pub(crate) fn new(max_runs: usize) -> Self {
        Self {
            order: VecDeque::new(),
            runs: HashMap::new(),
            max_runs: max_runs.max(1),
        }
    }

    /// Insert a new job run, maintaining the size limit.
    pub(crate) fn insert(&mut self, run: JobRun) {
        let id = run.id;
        self.runs.insert(id, run);
        self.order.push_back(id);
        self.trim();
    }

    /// Drop the oldest finished runs while over capacity. Live runs are kept
    /// even if that leaves the queue above its cap. Called on insert and
    /// whenever a run finishes.
    pub(crate) fn trim(&mut self) {
        let mut excess = self.runs.len().saturating_sub(self.max_runs);
        if excess == 0 {
            return;
        }
        let runs = &mut self.runs;
        self.order.retain(|id| {
            if excess == 0 {
                return true;
            }
            match runs.get(id) {
                Some(run) if run.status.is_terminal() => {
                    runs.remove(id);
                    excess -= 1;
                    false
                }
                Some(_) => true,
                None => false,
            }
        });
    }

    #[inline]
    pub(crate) fn get(&self, id: &Uuid) -> Option<&JobRun> {
        self.runs.get(id)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: &Uuid) -> Option<&mut JobRun> {
        self.runs.get_mut(id)
    }

    /// Iterate over all runs in reverse order (most recent first).
    pub(crate) fn iter_recent(&self) -> impl Iterator<Item = &JobRun> {
        self.order.iter().rev().filter_map(|id| self.runs.get(id))
    }

    pub(crate) fn count(&self, filter: &RunFilter) -> usize {
        self.runs.values().filter(|r| filter.matches(r)).count()
    }

    /// Remove every finished run and return how many were dropped.
    pub(crate) fn clear_finished(&mut self) -> usize {
        let before = self.runs.len();
        self.runs.retain(|_, run| !run.status.is_terminal());
        let runs = &self.runs;
        self.order.retain(|id| runs.contains_key(id));
        before - self.runs.len()
    }

    pub(crate) fn stats(&self) -> QueueStats {
        let mut stats = QueueStats::default();
        let mut durations: Vec<i64> = Vec::new();
        for run in self.runs.values() {
            match run.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => {
                    stats.completed += 1;
                    if let Some(ms) = run.duration_ms() {
                        durations.push(ms);
                    }
                }
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats.total = self.runs.len();
        if !durations.is_empty() {
            let sum: i64 = durations.iter().sum();
            stats.average_duration_ms = Some(sum as f64 / durations.len() as f64);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn finished(name: &str) -> JobRun {
        let mut run = JobRun::new(name, json!({}));
        assert!(run.transition(JobStatus::Processing));
        assert!(run.complete(json!(null)));
        run
    }

    #[test]
    fn trim_drops_oldest_finished_runs_only() {
        let mut state = JobQueueState::new(2);
        let live = JobRun::new("live", json!({}));
        let live_id = live.id;
        state.insert(live);
        let old = finished("old");
        let old_id = old.id;
        state.insert(old);
        state.insert(finished("new"));

        assert_eq!(state.runs.len(), 2);
        assert!(state.get(&live_id).is_some());
        assert!(state.get(&old_id).is_none());
    }

    #[test]
    fn trim_keeps_live_runs_over_capacity() {
        let mut state = JobQueueState::new(1);
        state.insert(JobRun::new("a", json!({})));
        state.insert(JobRun::new("b", json!({})));
        assert_eq!(state.runs.len(), 2);
        assert_eq!(state.order.len(), 2);
    }

    #[test]
    fn finishing_a_run_trims_the_excess() {
        let mut state = JobQueueState::new(1);
        let old = finished("old");
        let old_id = old.id;
        state.insert(old);
        let live = JobRun::new("live", json!({}));
        let live_id = live.id;
        state.insert(live);
        // only the live run could have been kept over the cap
        assert_eq!(state.runs.len(), 1);
        assert!(state.get(&old_id).is_none());

        let mut second = JobRun::new("second", json!({}));
        let second_id = second.id;
        assert!(second.transition(JobStatus::Processing));
        state.insert(second);
        assert_eq!(state.runs.len(), 2);

        let run = state.get_mut(&live_id).unwrap();
        assert!(run.transition(JobStatus::Processing));
        assert!(run.complete(json!(null)));
        state.trim();
        assert_eq!(state.runs.len(), 1);
        assert!(state.get(&live_id).is_none());
        assert!(state.get(&second_id).is_some());
    }

    #[test]
    fn clear_finished_keeps_queued() {
        let mut state = JobQueueState::new(10);
        state.insert(finished("a"));
        state.insert(JobRun::new("b", json!({})));
        assert_eq!(state.clear_finished(), 1);
        assert_eq!(state.iter_recent().count(), 1);
    }
}
