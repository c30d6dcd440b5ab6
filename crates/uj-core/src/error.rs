//! Error types for the lifecycle observer.

use std::time::Duration;

use uj_api_contract::UnifiedJob;
use uj_client_api::TaskServiceError;

/// Errors raised by [`TaskHandle`](crate::TaskHandle) operations.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The target status was not reached within the wall-clock budget.
    /// Carries the last observed snapshot and the elapsed time measured
    /// from the reference instant.
    #[error("timed out after {:.1}s waiting on job {} (last status: {:?})", .elapsed.as_secs_f64(), .last.id, .last.status)]
    Timeout { last: UnifiedJob, elapsed: Duration },

    /// `wait_until_status` was called with no target statuses.
    #[error("target status set is empty")]
    EmptyTargetSet,

    #[error("task service error: {0}")]
    Service(#[from] TaskServiceError),
}

pub type ObserverResult<T> = Result<T, ObserverError>;
