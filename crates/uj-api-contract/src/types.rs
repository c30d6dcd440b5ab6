//! API contract types for the unified-job REST service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Prefix carried by `job_explanation` when a task terminated because a
/// prerequisite task did not complete successfully. The prefix is
/// followed by the identifier of the prerequisite kind, e.g.
/// `Previous Task Failed: inventory_update`.
pub const EXPLANATION_PREFIX: &str = "Previous Task Failed: ";

/// Substring that marks an internal error in either output channel.
pub const TRACEBACK_MARKER: &str = "Traceback";

/// Unified-job lifecycle states, in typical order of progression.
///
/// `Successful`, `Failed`, `Error` and `Canceled` are terminal; a task
/// never transitions out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    New,
    Pending,
    Waiting,
    Running,
    Successful,
    Failed,
    Error,
    Canceled,
}

impl JobStatus {
    /// The four statuses from which no further transition occurs.
    pub const TERMINAL: [JobStatus; 4] = [
        JobStatus::Successful,
        JobStatus::Failed,
        JobStatus::Error,
        JobStatus::Canceled,
    ];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

/// The task kinds observed through the common lifecycle contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Job,
    ProjectUpdate,
    InventoryUpdate,
}

impl JobKind {
    /// Identifier used by the service in cascade explanations and
    /// resource paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Job => "job",
            JobKind::ProjectUpdate => "project_update",
            JobKind::InventoryUpdate => "inventory_update",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Links to related resources on a unified job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel: Option<String>,
}

/// Immutable view of a remote unified job at one point in time.
///
/// Refreshing a handle replaces the whole snapshot; there are no merge
/// semantics and no hidden counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UnifiedJob {
    #[validate(range(min = 1, message = "job id must be positive"))]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub kind: JobKind,
    pub status: JobStatus,
    #[serde(default)]
    pub failed: bool,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub result_stdout: String,
    #[serde(default)]
    pub result_traceback: String,
    #[serde(default)]
    pub job_explanation: String,
    #[serde(default)]
    pub elapsed: f64,
    #[serde(default)]
    pub related: RelatedLinks,
}

impl UnifiedJob {
    /// Whether the task has finished. This says nothing about whether
    /// it finished successfully.
    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether a traceback shows up in `result_traceback` or
    /// `result_stdout`. Both channels disqualify equally.
    pub fn has_traceback(&self) -> bool {
        self.result_traceback.contains(TRACEBACK_MARKER)
            || self.result_stdout.contains(TRACEBACK_MARKER)
    }

    /// Whether the task completed successfully. Stricter than the raw
    /// status: requires status `successful`, the `failed` flag unset,
    /// and no traceback in either output channel.
    pub fn is_successful(&self) -> bool {
        self.status == JobStatus::Successful && !self.failed && !self.has_traceback()
    }
}

impl std::fmt::Display for UnifiedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<{} id:{} status:{:?} failed:{} explanation:{}>",
            self.kind, self.id, self.status, self.failed, self.job_explanation
        )
    }
}

/// Body of the "related: cancel" resource on a unified job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelCapability {
    pub can_cancel: bool,
}

/// Prerequisite resource (inventory source or project) state relevant
/// to update-on-launch and cache-timeout behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateSource {
    #[validate(range(min = 1, message = "source id must be positive"))]
    pub id: u64,
    pub kind: JobKind,
    #[serde(default)]
    pub update_on_launch: bool,
    /// Seconds during which a completed update is considered current
    /// and is not re-triggered by a dependent-task launch. Zero means
    /// "always re-trigger".
    #[serde(default)]
    pub update_cache_timeout: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_job_run: Option<DateTime<Utc>>,
}
