//! Error types for Cribl Search client operations

use std::time::Duration;

use thiserror::Error;

use crate::id::JobId;

/// Structured error types for Cribl Search client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required credentials were missing or invalid
    #[error("{message}")]
    Configuration { message: String },

    /// OAuth2 token exchange or an authenticated call was rejected
    #[error("{message}")]
    Authentication { message: String },

    /// Query submission, execution, or result retrieval failed
    #[error("{message}")]
    Query {
        message: String,
        job_id: Option<JobId>,
    },

    /// Search job did not complete within the caller's deadline
    #[error(
        "Query did not complete within {} seconds. \
         Try narrowing the time range or adding '| limit N' to your query.",
        .timeout.as_secs()
    )]
    Timeout { timeout: Duration },
}

impl ClientError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into() }
    }

    /// Create a query error without an associated job
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query { message: message.into(), job_id: None }
    }

    /// Create a query error tied to a submitted job
    pub fn query_for_job(message: impl Into<String>, job_id: JobId) -> Self {
        Self::Query { message: message.into(), job_id: Some(job_id) }
    }

    /// Create a timeout error carrying the exceeded deadline
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Job the error relates to, when the server reported a verdict for one
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            ClientError::Query { job_id, .. } => job_id.as_ref(),
            _ => None,
        }
    }

    /// Check if this error means the credentials were rejected
    pub fn is_authentication(&self) -> bool {
        matches!(self, ClientError::Authentication { .. })
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
