//! HTTP client for the remote content API.
//!
//! One client is scoped either to the API root of a remote instance or to a
//! single collection's endpoints. Collection clients are derived from the
//! root client and share its connection pool and credentials.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::config::{ConfigError, RemoteConfig};
use crate::error::{Result, TransferError};

/// Client for a remote instance, optionally scoped to one collection.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    api_url: String,
}

impl RemoteClient {
    /// Build a client for the remote instance described by `config`.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token()))
            .map_err(|_| ConfigError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_url: config.api_url(),
        })
    }

    /// Derive a client scoped to one collection's endpoints.
    pub fn collection(&self, plural_name: &str) -> RemoteClient {
        RemoteClient {
            http: self.http.clone(),
            api_url: format!("{}/{}", self.api_url, plural_name),
        }
    }

    /// Base URL this client sends requests to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// GET a path under this client's base and parse the JSON body.
    ///
    /// `path` must be empty or start with `/` or `?`.
    pub async fn fetch(&self, path: &str) -> Result<Value> {
        self.execute(self.http.get(self.url(path))).await
    }

    /// POST a JSON body to a path under this client's base.
    pub async fn create(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    /// PUT a JSON body to a path under this client's base.
    pub async fn update(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(self.http.put(self.url(path)).json(body)).await
    }

    /// POST a multipart form to a path under this client's base.
    pub async fn upload(&self, path: &str, form: Form) -> Result<Value> {
        self.execute(self.http.post(self.url(path)).multipart(form))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        Self::parse(response).await
    }

    async fn parse(response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            let body = response.json::<Value>().await.ok();
            return Err(TransferError::Status { status, url, body });
        }
        Ok(response.json().await?)
    }
}
