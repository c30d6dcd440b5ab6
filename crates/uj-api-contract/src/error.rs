//! Error body and contract-level error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RFC 7807 style problem body returned by the service on errors.
///
/// The `detail` text is what distinguishes a "task is no longer
/// cancelable" rejection from other rejections on the cancel endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProblemDetails {
    /// Whether this problem describes a method-not-allowed rejection of
    /// a cancel request against a task that already left a cancelable
    /// state.
    pub fn is_not_allowed(&self) -> bool {
        self.detail
            .as_deref()
            .map(|d| d.contains("not allowed"))
            .unwrap_or(false)
    }
}

/// Errors raised when a payload violates the published contract.
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<validator::ValidationErrors> for ApiContractError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiContractError::Validation(errors.to_string())
    }
}
