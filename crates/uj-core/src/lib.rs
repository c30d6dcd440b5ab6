//! Unified-job lifecycle observer.
//!
//! Tracks a remote long-running task (a job run, project update, or
//! inventory update) through its status transitions, blocks the caller
//! until a target state is reached or a deadline expires, and models
//! the cascading failure that occurs when a task depends on a
//! prerequisite task that is canceled or fails before completion.
//!
//! The observer talks to the task service through the
//! [`TaskService`](uj_client_api::TaskService) trait; `uj-rest-client`
//! provides the HTTP implementation and `uj-rest-client-mock` a
//! scripted one for tests.

pub mod cascade;
pub mod error;
pub mod handle;

pub use cascade::{
    cascade_explanation, first_by_created, is_cascade_failure, should_trigger_update,
    verify_cache_hit, verify_cascade, verify_secondary_cascade, CascadeMismatch, DependencyLink,
};
pub use error::{ObserverError, ObserverResult};
pub use handle::{TaskHandle, WaitOpts, STARTED_STATUSES};
