//! Mock task service backed by scripted snapshot sequences
//!
//! Each registered job carries an ordered list of snapshots; `get_job`
//! hands them out one per call and repeats the last one once the script
//! is drained, so observers see a task progress through its lifecycle
//! without a real server.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uj_api_contract::{
    validation, CancelCapability, JobKind, JobStatus, RelatedLinks, UnifiedJob, UpdateSource,
};
use uj_client_api::{TaskService, TaskServiceError, TaskServiceResult};

/// How the mock answers a cancel POST.
#[derive(Debug, Clone, Default)]
pub enum CancelOutcome {
    /// Accept the request; `can_cancel` flips to false afterwards.
    #[default]
    Accept,
    /// Reject because the task already left a cancelable state, the
    /// way the real service answers with HTTP 405.
    RejectNotAllowed,
    /// Reject for some other reason.
    RejectOther(String),
}

/// Builder for snapshot values used in scripts and assertions.
#[derive(Debug, Clone)]
pub struct JobBuilder {
    job: UnifiedJob,
}

impl JobBuilder {
    pub fn new(id: u64, kind: JobKind, created: DateTime<Utc>) -> Self {
        Self {
            job: UnifiedJob {
                id,
                name: format!("{}-{}", kind, id),
                kind,
                status: JobStatus::New,
                failed: false,
                created,
                result_stdout: String::new(),
                result_traceback: String::new(),
                job_explanation: String::new(),
                elapsed: 0.0,
                related: RelatedLinks {
                    cancel: Some(format!("/api/v1/unified_jobs/{}/cancel/", id)),
                },
            },
        }
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.job.status = status;
        self
    }

    pub fn failed(mut self, failed: bool) -> Self {
        self.job.failed = failed;
        self
    }

    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.job.job_explanation = explanation.into();
        self
    }

    pub fn stdout(mut self, stdout: impl Into<String>) -> Self {
        self.job.result_stdout = stdout.into();
        self
    }

    pub fn traceback(mut self, traceback: impl Into<String>) -> Self {
        self.job.result_traceback = traceback.into();
        self
    }

    pub fn build(self) -> UnifiedJob {
        self.job
    }
}

/// Script for one job: the snapshot sequence plus cancel behavior.
#[derive(Debug, Clone)]
pub struct ScriptedJob {
    snapshots: Vec<UnifiedJob>,
    can_cancel: bool,
    cancel_outcome: CancelOutcome,
}

impl ScriptedJob {
    /// Build a script from snapshots in the order `get_job` should
    /// serve them. Panics if a snapshot violates the contract, so a
    /// broken script fails the test that registered it.
    pub fn new(snapshots: Vec<UnifiedJob>) -> Self {
        assert!(!snapshots.is_empty(), "script needs at least one snapshot");
        for snapshot in &snapshots {
            validation::validate_unified_job(snapshot)
                .unwrap_or_else(|e| panic!("invalid scripted snapshot: {}", e));
        }
        Self {
            snapshots,
            can_cancel: false,
            cancel_outcome: CancelOutcome::Accept,
        }
    }

    pub fn with_cancel(mut self, can_cancel: bool, outcome: CancelOutcome) -> Self {
        self.can_cancel = can_cancel;
        self.cancel_outcome = outcome;
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    jobs: HashMap<u64, ScriptedJob>,
    sources: HashMap<u64, UpdateSource>,
    cancel_posts: HashMap<u64, u32>,
}

/// In-memory [`TaskService`] implementation for tests.
#[derive(Debug, Default)]
pub struct MockTaskService {
    state: Mutex<MockState>,
}

impl MockTaskService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_job(&self, id: u64, script: ScriptedJob) {
        self.state.lock().unwrap().jobs.insert(id, script);
    }

    pub fn register_update_source(&self, source: UpdateSource) {
        validation::validate_update_source(&source)
            .unwrap_or_else(|e| panic!("invalid scripted update source: {}", e));
        self.state.lock().unwrap().sources.insert(source.id, source);
    }

    /// Record that an update run finished at `now`, the way a real
    /// launch that missed the cache would.
    pub fn touch_update_source(&self, id: u64, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        let source = state.sources.get_mut(&id).expect("unknown update source");
        source.last_updated = Some(now);
        source.last_job_run = Some(now);
    }

    /// Number of cancel POSTs received for a job.
    pub fn cancel_posts(&self, id: u64) -> u32 {
        self.state.lock().unwrap().cancel_posts.get(&id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl TaskService for MockTaskService {
    async fn get_job(&self, id: u64) -> TaskServiceResult<UnifiedJob> {
        let mut state = self.state.lock().unwrap();
        let script = state
            .jobs
            .get_mut(&id)
            .ok_or_else(|| TaskServiceError::Server(format!("no such job: {}", id)))?;
        // Consume the script one snapshot per refresh; the terminal
        // snapshot repeats once drained.
        if script.snapshots.len() > 1 {
            Ok(script.snapshots.remove(0))
        } else {
            Ok(script.snapshots[0].clone())
        }
    }

    async fn get_cancel_capability(&self, id: u64) -> TaskServiceResult<CancelCapability> {
        let state = self.state.lock().unwrap();
        let script = state
            .jobs
            .get(&id)
            .ok_or_else(|| TaskServiceError::Server(format!("no such job: {}", id)))?;
        Ok(CancelCapability {
            can_cancel: script.can_cancel,
        })
    }

    async fn post_cancel(&self, id: u64) -> TaskServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.jobs.contains_key(&id) {
            return Err(TaskServiceError::Server(format!("no such job: {}", id)));
        }
        *state.cancel_posts.entry(id).or_insert(0) += 1;
        let script = state.jobs.get_mut(&id).unwrap();
        match script.cancel_outcome.clone() {
            CancelOutcome::Accept => {
                script.can_cancel = false;
                Ok(())
            }
            CancelOutcome::RejectNotAllowed => Err(TaskServiceError::NotCancelable(
                "Cancel not allowed: job has already completed".into(),
            )),
            CancelOutcome::RejectOther(reason) => Err(TaskServiceError::Server(reason)),
        }
    }

    async fn get_update_source(&self, id: u64) -> TaskServiceResult<UpdateSource> {
        let state = self.state.lock().unwrap();
        state
            .sources
            .get(&id)
            .cloned()
            .ok_or_else(|| TaskServiceError::Server(format!("no such update source: {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_advances_and_terminal_snapshot_repeats() {
        let service = MockTaskService::new();
        let created = Utc::now();
        let script = ScriptedJob::new(vec![
            JobBuilder::new(1, JobKind::Job, created).status(JobStatus::Pending).build(),
            JobBuilder::new(1, JobKind::Job, created).status(JobStatus::Running).build(),
            JobBuilder::new(1, JobKind::Job, created).status(JobStatus::Successful).build(),
        ]);
        service.register_job(1, script);

        assert_eq!(service.get_job(1).await.unwrap().status, JobStatus::Pending);
        assert_eq!(service.get_job(1).await.unwrap().status, JobStatus::Running);
        assert_eq!(service.get_job(1).await.unwrap().status, JobStatus::Successful);
        assert_eq!(service.get_job(1).await.unwrap().status, JobStatus::Successful);
    }

    #[tokio::test]
    async fn cancel_posts_are_counted() {
        let service = MockTaskService::new();
        let script = ScriptedJob::new(vec![JobBuilder::new(2, JobKind::Job, Utc::now())
            .status(JobStatus::Running)
            .build()])
        .with_cancel(true, CancelOutcome::Accept);
        service.register_job(2, script);

        assert_eq!(service.cancel_posts(2), 0);
        service.post_cancel(2).await.unwrap();
        assert_eq!(service.cancel_posts(2), 1);
        assert!(!service.get_cancel_capability(2).await.unwrap().can_cancel);
    }

    #[tokio::test]
    async fn cancel_of_an_unknown_job_is_not_counted() {
        let service = MockTaskService::new();
        assert!(service.post_cancel(99).await.is_err());
        assert_eq!(service.cancel_posts(99), 0);
    }

    #[test]
    #[should_panic(expected = "invalid scripted snapshot")]
    fn failed_flag_on_running_snapshot_is_rejected() {
        ScriptedJob::new(vec![JobBuilder::new(3, JobKind::Job, Utc::now())
            .status(JobStatus::Running)
            .failed(true)
            .build()]);
    }
}
