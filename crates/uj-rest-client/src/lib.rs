//! REST API client for the unified-job task service
//!
//! This crate provides the HTTP implementation of the [`TaskService`]
//! seam consumed by `uj-core`. It covers authentication header
//! injection, request/response handling, and the status-code mapping
//! that lets callers distinguish a benign "task is no longer
//! cancelable" rejection from real server errors.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::*;
pub use client::*;
pub use error::*;

use async_trait::async_trait;
use uj_api_contract::{CancelCapability, UnifiedJob, UpdateSource};
use uj_client_api::{TaskService, TaskServiceError, TaskServiceResult};

impl From<RestClientError> for TaskServiceError {
    fn from(e: RestClientError) -> Self {
        match e {
            RestClientError::MethodNotAllowed(reason) => TaskServiceError::NotCancelable(reason),
            other => TaskServiceError::Server(other.to_string()),
        }
    }
}

#[async_trait]
impl TaskService for client::RestClient {
    async fn get_job(&self, id: u64) -> TaskServiceResult<UnifiedJob> {
        Ok(self.get_unified_job(id).await?)
    }

    async fn get_cancel_capability(&self, id: u64) -> TaskServiceResult<CancelCapability> {
        Ok(self.get_cancel(id).await?)
    }

    async fn post_cancel(&self, id: u64) -> TaskServiceResult<()> {
        Ok(RestClient::post_cancel(self, id).await?)
    }

    async fn get_update_source(&self, id: u64) -> TaskServiceResult<UpdateSource> {
        Ok(RestClient::get_update_source(self, id).await?)
    }
}
