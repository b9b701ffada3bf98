//! # Job Engine Errors
//!
//! The error taxonomy drives retry decisions: retriability is a property
//! of the error value, not of the call site.

use std::time::Duration;
use thiserror::Error;

/// Failure of a task invocation.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    /// Task configuration is invalid. Never retried.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A required external resource is unreachable. Retried.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The execute phase exceeded the metadata timeout. Retried.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Explicitly transient failure from the task body. Retried.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Domain or validation failure. Never retried.
    #[error("fatal failure: {0}")]
    Fatal(String),
}

impl JobError {
    /// Default retry classification per the execution policy.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::ResourceUnavailable(_) | Self::Timeout(_) | Self::Transient(_)
        )
    }

    /// Short stable label for metrics and dead letters.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigInvalid(_) => "config_invalid",
            Self::ResourceUnavailable(_) => "resource_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Transient(_) => "transient",
            Self::Fatal(_) => "fatal",
        }
    }
}

/// Failure to register a task.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The task type key is already taken.
    #[error("task type already registered: {0}")]
    AlreadyRegistered(String),
}
