//! Task service trait for unified-job observers
//!
//! `uj-core` polls remote tasks through this seam; `uj-rest-client`
//! implements it over HTTP and `uj-rest-client-mock` implements it over
//! scripted in-memory state.

use async_trait::async_trait;
use thiserror::Error;
use uj_api_contract::{CancelCapability, UnifiedJob, UpdateSource};

#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// The cancel endpoint rejected the request because the task has
    /// already left a cancelable state. Callers racing a `can_cancel`
    /// check against task completion treat this as benign.
    #[error("task is no longer cancelable: {0}")]
    NotCancelable(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("unexpected: {0}")]
    Unexpected(String),
}

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Request/response operations the lifecycle observer needs from the
/// task service. All operations are idempotent except `post_cancel`.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Fetch the current snapshot of a unified job.
    async fn get_job(&self, id: u64) -> TaskServiceResult<UnifiedJob>;

    /// Read the "related: cancel" capability of a unified job.
    async fn get_cancel_capability(&self, id: u64) -> TaskServiceResult<CancelCapability>;

    /// Request cancellation of a unified job.
    ///
    /// Implementations must map a terminal-state rejection to
    /// [`TaskServiceError::NotCancelable`] and every other rejection to
    /// [`TaskServiceError::Server`].
    async fn post_cancel(&self, id: u64) -> TaskServiceResult<()>;

    /// Fetch the update-on-launch prerequisite resource (inventory
    /// source or project) with the given id.
    async fn get_update_source(&self, id: u64) -> TaskServiceResult<UpdateSource>;
}
