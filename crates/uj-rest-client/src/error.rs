//! Error types for the REST API client

use reqwest::StatusCode;
use thiserror::Error;
use uj_api_contract::ProblemDetails;

/// Errors that can occur when using the REST API client
#[derive(Debug, Error)]
pub enum RestClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// The cancel endpoint rejected the request because the task has
    /// already left a cancelable state (HTTP 405 with a "not allowed"
    /// detail). Kept distinct so the cancel race rule can match on it.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Server returned error status {status}: {details:?}")]
    ServerError {
        status: StatusCode,
        details: ProblemDetails,
    },

    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),
}

/// Result type alias for REST client operations
pub type RestClientResult<T> = Result<T, RestClientError>;
