//! Status polling engine for unified jobs.
//!
//! A [`TaskHandle`] wraps one remote task's identity and its most
//! recently observed snapshot. Polling is caller-driven: the caller's
//! task blocks inside [`TaskHandle::wait_until_status`], sleeping
//! between refreshes. No background work is spawned and no state is
//! shared between handles; the remote service is the single source of
//! truth.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, warn};

use uj_api_contract::{JobStatus, UnifiedJob};
use uj_client_api::{TaskService, TaskServiceError};

use crate::error::{ObserverError, ObserverResult};

/// Statuses that indicate a task has left the queue. Terminal statuses
/// are included so a fast task that finished before the first poll
/// still counts as started.
pub const STARTED_STATUSES: [JobStatus; 6] = [
    JobStatus::Pending,
    JobStatus::Running,
    JobStatus::Successful,
    JobStatus::Failed,
    JobStatus::Error,
    JobStatus::Canceled,
];

/// Bounds for one wait operation.
#[derive(Debug, Clone, Copy)]
pub struct WaitOpts {
    /// Minimum delay between successive refreshes.
    pub interval: Duration,
    /// Maximum elapsed wall-clock budget, measured from `reference`.
    pub timeout: Duration,
    /// Start of the measured window. Defaults to the task's `created`
    /// timestamp, so time spent before the caller began polling counts
    /// against the budget.
    pub reference: Option<DateTime<Utc>>,
}

impl WaitOpts {
    /// Defaults for "has the task started" checks.
    pub fn started() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            reference: None,
        }
    }

    /// Defaults for "has the task completed" checks.
    pub fn completed() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(180),
            reference: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn since(mut self, reference: DateTime<Utc>) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Observer for one remote unified job.
///
/// Owns exactly one snapshot at a time; [`refresh`](Self::refresh)
/// replaces it wholesale. Handles are independent values: two handles
/// on the same job id may disagree until each refreshes.
pub struct TaskHandle {
    service: Arc<dyn TaskService>,
    current: UnifiedJob,
}

impl TaskHandle {
    /// Start observing a job by fetching its current snapshot.
    pub async fn observe(service: Arc<dyn TaskService>, id: u64) -> ObserverResult<Self> {
        let current = service.get_job(id).await?;
        Ok(Self { service, current })
    }

    /// Wrap a snapshot already in hand, e.g. from a launch response.
    pub fn from_snapshot(service: Arc<dyn TaskService>, snapshot: UnifiedJob) -> Self {
        Self {
            service,
            current: snapshot,
        }
    }

    pub fn id(&self) -> u64 {
        self.current.id
    }

    /// The most recently observed snapshot.
    pub fn snapshot(&self) -> &UnifiedJob {
        &self.current
    }

    /// Fetch the latest snapshot, replace the current view, and return
    /// a copy. No merge semantics.
    pub async fn refresh(&mut self) -> ObserverResult<UnifiedJob> {
        self.current = self.service.get_job(self.current.id).await?;
        Ok(self.current.clone())
    }

    /// Poll until the job's status lands in `target`.
    ///
    /// Refreshes strictly sequentially, sleeping `opts.interval`
    /// between polls. The elapsed budget is measured from the reference
    /// instant, not from the first poll: a job created 30s ago polled
    /// with a 60s timeout has 30s of budget left. On expiry returns
    /// [`ObserverError::Timeout`] with the last snapshot; it never
    /// silently returns a non-target snapshot.
    pub async fn wait_until_status(
        &mut self,
        target: &[JobStatus],
        opts: WaitOpts,
    ) -> ObserverResult<UnifiedJob> {
        if target.is_empty() {
            return Err(ObserverError::EmptyTargetSet);
        }

        let reference = opts.reference.unwrap_or(self.current.created);
        // Budget consumed before polling began. A reference in the
        // future clamps to zero rather than extending the deadline.
        let consumed = (Utc::now() - reference).to_std().unwrap_or(Duration::ZERO);
        let started = Instant::now();

        loop {
            let snapshot = self.refresh().await?;
            if target.contains(&snapshot.status) {
                debug!(
                    job_id = snapshot.id,
                    status = ?snapshot.status,
                    "job reached target status"
                );
                return Ok(snapshot);
            }

            let elapsed = consumed + started.elapsed();
            if elapsed >= opts.timeout {
                warn!(
                    job_id = snapshot.id,
                    status = ?snapshot.status,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "gave up waiting on job"
                );
                return Err(ObserverError::Timeout {
                    last: snapshot,
                    elapsed,
                });
            }

            tokio::time::sleep(opts.interval).await;
        }
    }

    /// Wait until the job has left the queue (1s interval, 60s budget).
    pub async fn wait_until_started(&mut self) -> ObserverResult<UnifiedJob> {
        self.wait_until_status(&STARTED_STATUSES, WaitOpts::started()).await
    }

    /// Wait until the job has finished, successfully or not (5s
    /// interval, 180s budget).
    pub async fn wait_until_completed(&mut self) -> ObserverResult<UnifiedJob> {
        self.wait_until_status(&JobStatus::TERMINAL, WaitOpts::completed()).await
    }

    /// Variants of the helpers above with caller-supplied bounds.
    pub async fn wait_until_started_opts(&mut self, opts: WaitOpts) -> ObserverResult<UnifiedJob> {
        self.wait_until_status(&STARTED_STATUSES, opts).await
    }

    pub async fn wait_until_completed_opts(&mut self, opts: WaitOpts) -> ObserverResult<UnifiedJob> {
        self.wait_until_status(&JobStatus::TERMINAL, opts).await
    }

    /// Request cancellation of the job.
    ///
    /// A job past its cancelable window is a benign no-op: nothing is
    /// posted and no error is raised. A rejection because the job
    /// finished between the capability check and the POST is likewise
    /// swallowed; any other rejection propagates.
    pub async fn cancel(&self) -> ObserverResult<()> {
        let id = self.current.id;
        let capability = self.service.get_cancel_capability(id).await?;
        if !capability.can_cancel {
            debug!(job_id = id, "job is not cancelable; skipping cancel request");
            return Ok(());
        }

        match self.service.post_cancel(id).await {
            Ok(()) => Ok(()),
            Err(TaskServiceError::NotCancelable(reason)) => {
                debug!(job_id = id, %reason, "cancel raced job completion");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.current.id)
            .field("status", &self.current.status)
            .finish()
    }
}
