//! Authentication methods for the REST API client

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Authentication methods supported by the task service
#[derive(Debug, Clone, Default)]
pub enum AuthMethod {
    /// Session token authentication (`Authorization: Token <token>`)
    Token(String),
    /// OAuth2 bearer token (`Authorization: Bearer <token>`)
    Bearer(String),
    /// No authentication
    #[default]
    None,
}

impl AuthMethod {
    /// Apply authentication headers to a request
    pub fn apply_to_headers(
        &self,
        headers: &mut HeaderMap,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match self {
            AuthMethod::Token(token) => {
                let value = format!("Token {}", token);
                headers.insert(
                    HeaderName::from_static("authorization"),
                    HeaderValue::from_str(&value)?,
                );
            }
            AuthMethod::Bearer(token) => {
                let value = format!("Bearer {}", token);
                headers.insert(
                    HeaderName::from_static("authorization"),
                    HeaderValue::from_str(&value)?,
                );
            }
            AuthMethod::None => {
                // No headers to add
            }
        }
        Ok(())
    }

    /// Create session token authentication from a token string
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Create bearer token authentication from an OAuth2 token string
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }
}

/// Authentication configuration for the client
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub method: AuthMethod,
}

impl AuthConfig {
    /// Create a new auth config with session token authentication
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::token(token),
        }
    }

    /// Create a new auth config with bearer token authentication
    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::bearer(token),
        }
    }

    /// Get headers for this authentication configuration
    pub fn headers(&self) -> Result<HeaderMap, Box<dyn std::error::Error + Send + Sync>> {
        let mut headers = HeaderMap::new();
        self.method.apply_to_headers(&mut headers)?;
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_auth_headers() {
        let auth = AuthMethod::token("test-token");
        let mut headers = HeaderMap::new();
        auth.apply_to_headers(&mut headers).unwrap();

        assert_eq!(headers.get("authorization").unwrap(), "Token test-token");
    }

    #[test]
    fn test_bearer_auth_headers() {
        let auth = AuthMethod::bearer("oauth-token");
        let mut headers = HeaderMap::new();
        auth.apply_to_headers(&mut headers).unwrap();

        assert_eq!(headers.get("authorization").unwrap(), "Bearer oauth-token");
    }

    #[test]
    fn test_no_auth_adds_nothing() {
        let config = AuthConfig::default();
        let headers = config.headers().unwrap();
        assert!(headers.is_empty());
    }
}
