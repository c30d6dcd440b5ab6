//! Dependency cascade model.
//!
//! A job launched with update-on-launch prerequisites (project or
//! inventory updates) implicitly triggers them before its own body
//! runs. When a prerequisite ends `canceled`, `failed` or `error`, the
//! dependent job must end `failed` with an explanation naming the
//! prerequisite kind. The model here is deliberately decoupled from
//! the polling engine: links are plain records captured at launch time
//! and verified after both sides reach a terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use uj_api_contract::{JobKind, JobStatus, UnifiedJob, UpdateSource, EXPLANATION_PREFIX};

/// Relationship recorded when a job is launched contingent on a
/// prerequisite update completing successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyLink {
    /// Id of the dependent job.
    pub dependent: u64,
    /// Id of the prerequisite update task.
    pub prerequisite: u64,
    /// Kind of the prerequisite (`ProjectUpdate` or `InventoryUpdate`).
    pub kind: JobKind,
}

/// A dependent job's terminal state did not match what the cascade
/// model predicts. This is a verification failure, not a runtime fault
/// of the observer.
#[derive(Debug, thiserror::Error)]
pub enum CascadeMismatch {
    #[error("prerequisite {id} has not reached a terminal status (observed {status:?})")]
    PrerequisiteNotDone { id: u64, status: JobStatus },

    #[error("dependent {id} has not reached a terminal status (observed {status:?})")]
    DependentNotDone { id: u64, status: JobStatus },

    #[error("job {id}: expected terminal status {expected:?}, observed {observed:?}")]
    StatusMismatch {
        id: u64,
        expected: JobStatus,
        observed: JobStatus,
    },

    #[error("job {id}: explanation {observed:?} does not start with {expected_prefix:?}")]
    ExplanationMismatch {
        id: u64,
        expected_prefix: String,
        observed: String,
    },

    #[error("job {id}: unexpected cascade explanation {explanation:?} after successful prerequisite")]
    UnexpectedCascade { id: u64, explanation: String },

    #[error("update source {id}: {field} changed across a launch that should have hit the cache")]
    CacheInvalidated { id: u64, field: &'static str },
}

/// Explanation a dependent job carries when the prerequisite of the
/// given kind did not complete successfully, e.g.
/// `Previous Task Failed: inventory_update`.
pub fn cascade_explanation(kind: JobKind) -> String {
    format!("{}{}", EXPLANATION_PREFIX, kind.as_str())
}

/// Whether a job's explanation marks it as a cascade failure caused by
/// a prerequisite of the given kind.
pub fn is_cascade_failure(job: &UnifiedJob, kind: JobKind) -> bool {
    job.job_explanation.starts_with(&cascade_explanation(kind))
}

/// Statuses of a prerequisite that propagate failure to dependents.
fn propagates_failure(status: JobStatus) -> bool {
    matches!(
        status,
        JobStatus::Failed | JobStatus::Error | JobStatus::Canceled
    )
}

/// Verify a dependent job's terminal state against its prerequisite's.
///
/// Both snapshots must be terminal. A prerequisite that ended
/// `canceled`, `failed` or `error` requires the dependent to have ended
/// `failed` with the kind-naming explanation prefix; a successful
/// prerequisite forbids that prefix.
pub fn verify_cascade(
    dependent: &UnifiedJob,
    prerequisite: &UnifiedJob,
    link: &DependencyLink,
) -> Result<(), CascadeMismatch> {
    if !prerequisite.is_completed() {
        return Err(CascadeMismatch::PrerequisiteNotDone {
            id: prerequisite.id,
            status: prerequisite.status,
        });
    }
    if !dependent.is_completed() {
        return Err(CascadeMismatch::DependentNotDone {
            id: dependent.id,
            status: dependent.status,
        });
    }

    if propagates_failure(prerequisite.status) {
        if dependent.status != JobStatus::Failed {
            return Err(CascadeMismatch::StatusMismatch {
                id: dependent.id,
                expected: JobStatus::Failed,
                observed: dependent.status,
            });
        }
        if !is_cascade_failure(dependent, link.kind) {
            return Err(CascadeMismatch::ExplanationMismatch {
                id: dependent.id,
                expected_prefix: cascade_explanation(link.kind),
                observed: dependent.job_explanation.clone(),
            });
        }
    } else if dependent.job_explanation.starts_with(EXPLANATION_PREFIX) {
        return Err(CascadeMismatch::UnexpectedCascade {
            id: dependent.id,
            explanation: dependent.job_explanation.clone(),
        });
    }

    Ok(())
}

/// Order two prerequisites by launch time. The earlier `created`
/// timestamp is "first"; ties fall back to the lower id so the result
/// is deterministic under a coarse clock.
pub fn first_by_created<'a>(
    a: &'a UnifiedJob,
    b: &'a UnifiedJob,
) -> (&'a UnifiedJob, &'a UnifiedJob) {
    if (b.created, b.id) < (a.created, a.id) {
        (b, a)
    } else {
        (a, b)
    }
}

/// Verify the secondary cascade between two prerequisites triggered by
/// the same launch: when the earlier-created one is canceled, the later
/// one must itself end `failed` with the same explanation prefix
/// rather than succeed independently.
pub fn verify_secondary_cascade(
    prereq_a: &UnifiedJob,
    prereq_b: &UnifiedJob,
) -> Result<(), CascadeMismatch> {
    let (first, second) = first_by_created(prereq_a, prereq_b);

    if first.status != JobStatus::Canceled {
        return Err(CascadeMismatch::StatusMismatch {
            id: first.id,
            expected: JobStatus::Canceled,
            observed: first.status,
        });
    }
    if second.status != JobStatus::Failed {
        return Err(CascadeMismatch::StatusMismatch {
            id: second.id,
            expected: JobStatus::Failed,
            observed: second.status,
        });
    }
    if !is_cascade_failure(second, first.kind) {
        return Err(CascadeMismatch::ExplanationMismatch {
            id: second.id,
            expected_prefix: cascade_explanation(first.kind),
            observed: second.job_explanation.clone(),
        });
    }

    Ok(())
}

/// Whether a dependent-task launch at `now` re-triggers the
/// prerequisite update.
///
/// A source that never updates on launch does not trigger. A zero
/// cache timeout means "always re-trigger"; otherwise the cache holds
/// while `last_updated` is within the window.
pub fn should_trigger_update(source: &UpdateSource, now: DateTime<Utc>) -> bool {
    if !source.update_on_launch {
        return false;
    }
    let Some(last_updated) = source.last_updated else {
        return true;
    };
    if source.update_cache_timeout == 0 {
        return true;
    }
    now - last_updated >= chrono::Duration::seconds(i64::from(source.update_cache_timeout))
}

/// Verify that a launch left a cache-valid prerequisite untouched:
/// `last_updated` and `last_job_run` must be unchanged.
pub fn verify_cache_hit(
    before: &UpdateSource,
    after: &UpdateSource,
) -> Result<(), CascadeMismatch> {
    if before.last_updated != after.last_updated {
        return Err(CascadeMismatch::CacheInvalidated {
            id: before.id,
            field: "last_updated",
        });
    }
    if before.last_job_run != after.last_job_run {
        return Err(CascadeMismatch::CacheInvalidated {
            id: before.id,
            field: "last_job_run",
        });
    }
    Ok(())
}
