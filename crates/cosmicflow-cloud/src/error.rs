//! Cloud provider error types

use std::fmt;
use thiserror::Error;

/// Errors returned by the remote Cosmic API client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Structured not-found answer for the given id or name
    #[error("Entity does not exist: {0}")]
    NotFound(String),

    /// The async job was accepted but did not finish within the client's
    /// polling window. The operation may still complete remotely.
    #[error("Timeout while waiting for async job {job_id} to complete")]
    AsyncTimeout { job_id: String },

    #[error("API error {code}: {message}")]
    Remote { code: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn remote(code: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            code,
            message: message.into(),
        }
    }

    pub fn is_async_timeout(&self) -> bool {
        matches!(self, Self::AsyncTimeout { .. })
    }
}

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rejected attribute values. Raised before any remote call is made.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Error retrieving ID of {kind} {value}: {reason}")]
    Lookup {
        kind: String,
        value: String,
        reason: String,
    },

    #[error("Error {action}: {source}")]
    Operation {
        action: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// A batch worker panicked or could not be scheduled
    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a remote failure with a description of what was being attempted
    pub fn operation(action: impl Into<String>, source: ApiError) -> Self {
        Self::Operation {
            action: action.into(),
            source,
        }
    }

    /// The remote error underneath this error, if there is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) | Self::Operation { source: e, .. } => Some(e),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// The failure of a single rule inside a batch
#[derive(Debug)]
pub struct ItemError {
    /// Human readable description of the rule
    pub rule: String,
    pub error: CloudError,
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.error)
    }
}

/// Every failure collected during one or more batch runs
#[derive(Debug, Default)]
pub struct BatchError {
    errors: Vec<ItemError>,
}

impl BatchError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: impl Into<String>, error: CloudError) {
        self.errors.push(ItemError {
            rule: rule.into(),
            error,
        });
    }

    /// Append all failures of another batch
    pub fn merge(&mut self, other: BatchError) {
        self.errors.extend(other.errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemError> {
        self.errors.iter()
    }

    /// `None` when nothing failed
    pub fn into_option(self) -> Option<BatchError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// Combine two optional batch errors into one
    pub fn combine(a: Option<BatchError>, b: Option<BatchError>) -> Option<BatchError> {
        match (a, b) {
            (Some(mut a), Some(b)) => {
                a.merge(b);
                Some(a)
            }
            (a, None) => a,
            (None, b) => b,
        }
    }
}

impl IntoIterator for BatchError {
    type Item = ItemError;
    type IntoIter = std::vec::IntoIter<ItemError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.errors.len();
        write!(
            f,
            "{} error{} occurred:",
            n,
            if n == 1 { "" } else { "s" }
        )?;
        for e in &self.errors {
            write!(f, "\n\t* {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

pub type Result<T> = std::result::Result<T, CloudError>;
