//! Unified error handling for the transfer runtime.

use courier_engine::{scalar_text, ErrorDetail};
use serde_json::Value;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Transfer error type.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
        body: Option<Value>,
    },

    #[error("Engine error: {0}")]
    Engine(#[from] courier_engine::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransferError {
    /// Break a failed remote call into reportable details.
    ///
    /// Pure transport failures carry no remote diagnostics and produce an
    /// empty list. Status failures surface the structured error body when the
    /// remote returned one.
    pub fn error_details(&self) -> Vec<ErrorDetail> {
        let body = match self {
            TransferError::Status { body, .. } => body.as_ref(),
            _ => return Vec::new(),
        };

        let error = match body.and_then(|body| body.get("error")) {
            Some(error) => error,
            None => return vec![ErrorDetail::new(self.to_string(), "Transport error")],
        };

        let detail_errors = error
            .get("details")
            .and_then(|details| details.get("errors"))
            .and_then(Value::as_array);

        match detail_errors {
            Some(errors) if !errors.is_empty() => errors.iter().map(detail_from_value).collect(),
            _ => {
                let message = error
                    .get("message")
                    .map(scalar_text)
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| self.to_string());
                vec![ErrorDetail::new(message, "Request error")]
            }
        }
    }
}

/// Map one remote validation entry onto a reportable detail.
fn detail_from_value(value: &Value) -> ErrorDetail {
    let message = value.get("message").map(scalar_text).unwrap_or_default();
    let name = value
        .get("name")
        .map(scalar_text)
        .unwrap_or_else(|| "Request error".to_string());
    ErrorDetail::new(message, name)
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;
