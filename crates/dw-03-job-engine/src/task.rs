//! # Task Contract
//!
//! The phase interface every background task implements. The executor
//! calls the phases in order; defaults make each phase opt-in, so a
//! simple task only writes `execute`.

use crate::errors::JobError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-invocation context handed to every phase.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// The task type being executed.
    pub task_type: String,
    /// 1-based attempt number within this logical invocation.
    pub attempt: u32,
    /// Total attempts the retry budget allows.
    pub max_attempts: u32,
    /// Work-unit budget from the metadata.
    pub batch_size: usize,
    /// Correlates all log lines and outcomes of one invocation.
    pub correlation_id: Uuid,
}

/// Result of one unit of work inside a task invocation.
///
/// A task returns one outcome per unit it processed (per block, per
/// proposal, ...); the executor aggregates them for metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,
    /// Stable error label when the unit failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Task-specific payload (e.g. blocks processed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl JobOutcome {
    /// Successful outcome with a message.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            payload: None,
        }
    }

    /// Successful outcome carrying a payload.
    #[must_use]
    pub fn ok_with(message: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            payload: Some(payload),
        }
    }

    /// Failed outcome recording the error kind.
    #[must_use]
    pub fn failed(message: impl Into<String>, error: &JobError) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.kind().to_string()),
            payload: None,
        }
    }

    /// Failed outcome carrying a payload.
    #[must_use]
    pub fn failed_with(
        message: impl Into<String>,
        error: &JobError,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.kind().to_string()),
            payload: Some(payload),
        }
    }
}

/// A background task. Phases run in declaration order; `cleanup` always
/// runs, even when an earlier phase failed.
#[async_trait]
pub trait Task: Send + Sync {
    /// Phase 1: configuration sanity. Failures are never retried.
    async fn validate_config(&self, _ctx: &JobContext) -> Result<(), JobError> {
        Ok(())
    }

    /// Phase 2: required externals reachable. Failures are retried.
    async fn validate_resources(&self, _ctx: &JobContext) -> Result<(), JobError> {
        Ok(())
    }

    /// Phase 3: is there work to do? `false` is a clean no-op.
    async fn should_run(&self, _ctx: &JobContext) -> Result<bool, JobError> {
        Ok(true)
    }

    /// Phase 4: the work. One outcome per processed unit.
    async fn execute(&self, ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError>;

    /// Phase 5: resource release. `outcomes` is `None` when execute did
    /// not complete.
    async fn cleanup(&self, _ctx: &JobContext, _outcomes: Option<&[JobOutcome]>) {}

    /// Retry classification hook; defaults to the taxonomy's rule.
    fn is_retriable(&self, error: &JobError) -> bool {
        error.is_retriable()
    }
}
