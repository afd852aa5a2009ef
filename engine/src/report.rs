//! Accumulated error items and the `{data, errors}` report envelope.
//!
//! A transfer never fails as a unit. Every recoverable failure is converted
//! into an [`ErrorItem`] at the smallest granularity (one media file, one
//! relation target, one entity, one locale) and collected alongside the data
//! that did go through.

use serde::{Deserialize, Serialize};

/// One structured detail line of a remote validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Human-readable description
    pub message: String,
    /// Error class reported by the remote, or a local classification
    pub name: String,
}

impl ErrorDetail {
    /// Create a new detail line.
    pub fn new(message: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            name: name.into(),
        }
    }
}

/// One accumulated, non-fatal failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorItem {
    /// What failed, phrased for the end user
    pub message: String,
    /// Field the failure relates to, when one applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Structured details parsed from the remote response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ErrorDetail>>,
}

impl ErrorItem {
    /// Create a bare error item.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            details: None,
        }
    }

    /// Attach the field this item relates to.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach structured details.
    pub fn with_details(mut self, details: Vec<ErrorDetail>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Envelope pairing a (possibly partial) result with the errors met on the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReport<T> {
    /// The data that was produced
    pub data: T,
    /// Failures accumulated while producing it
    pub errors: Vec<ErrorItem>,
}

impl<T> TransferReport<T> {
    /// Create a report with data and no errors.
    pub fn ok(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// Create a report from data and accumulated errors.
    pub fn new(data: T, errors: Vec<ErrorItem>) -> Self {
        Self { data, errors }
    }

    /// Whether any error was accumulated.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
