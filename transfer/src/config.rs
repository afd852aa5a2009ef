//! Remote endpoint configuration.

use std::time::Duration;

/// Connection settings for a remote Courier-compatible instance.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the remote instance, stored without a trailing slash
    base_url: String,
    /// API token sent as a bearer credential
    token: String,
    /// Optional timeout applied to every remote request
    timeout: Option<Duration>,
}

impl RemoteConfig {
    /// Create a configuration for the given instance URL and API token.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        let token = token.into();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        Ok(Self {
            base_url,
            token,
            timeout: None,
        })
    }

    /// Set a timeout for remote requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Root of the remote content API.
    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url)
    }

    /// Bearer token for the remote instance.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Request timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Remote base URL cannot be empty")]
    MissingBaseUrl,

    #[error("Remote API token cannot be empty")]
    MissingToken,

    #[error("Remote API token contains invalid characters")]
    InvalidToken,
}
