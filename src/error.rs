//! # Error Taxonomy
//!
//! Structured errors surfaced by the registry, router and health components.

use crate::constants::ErrorCategory;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Unknown executor or task type. Programmer error, never retried.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The lazy factory for an executor failed. The next resolve retries it.
    #[error("Executor '{executor}' failed to initialize: {reason}")]
    InitializationFailed { executor: String, reason: String },

    #[error("Executor '{executor}' timed out after {}ms", .timeout.as_millis())]
    Timeout { executor: String, timeout: Duration },

    #[error("Executor '{executor}' failed: {source}")]
    ExecutorFailure {
        executor: String,
        #[source]
        source: anyhow::Error,
    },

    /// Routing table empty after health filtering.
    #[error("No healthy executor available for task type '{task_type}'")]
    NoHealthyExecutor { task_type: String },

    #[error("Orchestration failed: primary: {primary}; fallback: {fallback}")]
    OrchestrationFailed {
        primary: Box<RelayError>,
        fallback: Box<RelayError>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Category recorded on the failing performance metric
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::NotFound(_) => ErrorCategory::NotFound,
            RelayError::InitializationFailed { .. } => ErrorCategory::Initialization,
            RelayError::Timeout { .. } => ErrorCategory::Timeout,
            RelayError::ExecutorFailure { .. } => ErrorCategory::ExecutorFailure,
            RelayError::NoHealthyExecutor { .. } => ErrorCategory::NoHealthyExecutor,
            // The fallback is the last thing that ran, so its cause wins.
            RelayError::OrchestrationFailed { fallback, .. } => fallback.category(),
            RelayError::Configuration(_) => ErrorCategory::Configuration,
            RelayError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the router may absorb this failure by trying a fallback executor
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelayError::Timeout { .. }
                | RelayError::ExecutorFailure { .. }
                | RelayError::InitializationFailed { .. }
        )
    }
}

impl From<crate::config::ConfigurationError> for RelayError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        RelayError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
