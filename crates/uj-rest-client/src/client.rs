//! Main REST API client implementation

use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use uj_api_contract::{CancelCapability, ProblemDetails, UnifiedJob, UpdateSource};

use crate::auth::AuthConfig;
use crate::error::{RestClientError, RestClientResult};

/// REST API client for the unified-job task service
#[derive(Debug, Clone)]
pub struct RestClient {
    http_client: HttpClient,
    base_url: Url,
    auth: AuthConfig,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(base_url: Url, auth: AuthConfig) -> Self {
        let http_client = HttpClient::builder()
            .user_agent("uj-observer/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url,
            auth,
        }
    }

    /// Create a client from a base URL string
    pub fn from_url(base_url: &str, auth: AuthConfig) -> RestClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(Self::new(base_url, auth))
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the authentication config
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Fetch the current snapshot of a unified job
    pub async fn get_unified_job(&self, id: u64) -> RestClientResult<UnifiedJob> {
        let url = format!("/api/v1/unified_jobs/{}/", id);
        self.get(&url).await
    }

    /// Read the cancel capability of a unified job
    pub async fn get_cancel(&self, id: u64) -> RestClientResult<CancelCapability> {
        let url = format!("/api/v1/unified_jobs/{}/cancel/", id);
        self.get(&url).await
    }

    /// Request cancellation of a unified job
    pub async fn post_cancel(&self, id: u64) -> RestClientResult<()> {
        let url = format!("/api/v1/unified_jobs/{}/cancel/", id);
        debug!(job_id = id, "posting cancel request");
        self.post_empty(&url).await
    }

    /// Fetch an update-on-launch prerequisite resource
    pub async fn get_update_source(&self, id: u64) -> RestClientResult<UpdateSource> {
        let url = format!("/api/v1/update_sources/{}/", id);
        self.get(&url).await
    }

    // Private helper methods

    async fn get<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        let response = self.request(Method::GET, path, None::<&()>).await?;
        self.handle_response(response).await
    }

    async fn post_empty(&self, path: &str) -> RestClientResult<()> {
        let response = self.request(Method::POST, path, Some(&())).await?;
        self.handle_empty_response(response).await
    }

    async fn request<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> RestClientResult<Response> {
        let url = self.base_url.join(path)?;

        let mut request = self.http_client.request(method, url);

        // Add authentication headers
        let auth_headers = self.auth.headers().map_err(|e| RestClientError::Auth(e.to_string()))?;
        request = request.headers(auth_headers);

        // Add body if provided
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> RestClientResult<T> {
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            serde_json::from_str(&text).map_err(RestClientError::from)
        } else {
            Err(self.error_from_response(status, response).await)
        }
    }

    async fn handle_empty_response(&self, response: Response) -> RestClientResult<()> {
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(self.error_from_response(status, response).await)
        }
    }

    async fn error_from_response(&self, status: StatusCode, response: Response) -> RestClientError {
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return RestClientError::Http(e),
        };
        classify_error(status, &text)
    }
}

/// Map an error status and body to the client error taxonomy. A 405
/// whose problem detail carries "not allowed" is the benign cancel
/// rejection; everything else is a server error or an unparseable
/// response.
fn classify_error(status: StatusCode, body: &str) -> RestClientError {
    match serde_json::from_str::<ProblemDetails>(body) {
        Ok(details) => {
            if status == StatusCode::METHOD_NOT_ALLOWED && details.is_not_allowed() {
                let detail = details.detail.unwrap_or_default();
                RestClientError::MethodNotAllowed(detail)
            } else {
                RestClientError::ServerError { status, details }
            }
        }
        Err(_) => RestClientError::UnexpectedResponse(body.to_string()),
    }
}
