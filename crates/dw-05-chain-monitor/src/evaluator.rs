//! # Proposal Evaluator Task
//!
//! Drains active, unevaluated proposals through an opaque evaluator
//! port and writes the verdicts back. The evaluator itself (an LLM
//! wrapper in production) lives outside the core; tests and local runs
//! inject their own.

use async_trait::async_trait;
use dw_01_store_gateway::{ProposalUpdate, Store};
use dw_03_job_engine::{
    ExternalResource, JobContext, JobError, JobOutcome, JobPriority, Task, TaskMetadata,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_types::Proposal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Task type key for registration and config overrides.
pub const TASK_TYPE: &str = "proposal_evaluator";

/// Verdict produced by an evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// 0-100 quality score.
    pub score: f64,
    /// Approve / reject.
    pub decision: bool,
    pub summary: String,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Errors from the evaluator port.
#[derive(Debug, Clone, Error)]
pub enum EvaluatorError {
    /// The backing service is unreachable; worth retrying.
    #[error("evaluator unavailable: {0}")]
    Unavailable(String),

    /// The proposal could not be evaluated.
    #[error("evaluation failed: {0}")]
    Failed(String),
}

/// Opaque proposal evaluation.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, proposal: &Proposal) -> Result<Evaluation, EvaluatorError>;
}

/// Writes evaluator verdicts onto unevaluated proposals.
pub struct ProposalEvaluatorTask {
    store: Arc<dyn Store>,
    evaluator: Arc<dyn Evaluator>,
}

impl ProposalEvaluatorTask {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, evaluator: Arc<dyn Evaluator>) -> Self {
        Self { store, evaluator }
    }

    /// The task contract this evaluator registers under.
    #[must_use]
    pub fn metadata() -> TaskMetadata {
        TaskMetadata::new(TASK_TYPE, "Proposal Evaluator")
            .with_description("Evaluates active proposals and records verdicts")
            .with_interval(Duration::from_secs(60))
            .with_priority(JobPriority::High)
            .with_max_retries(2)
            .with_retry_delay(Duration::from_secs(30))
            .with_timeout(Duration::from_secs(120))
            .with_max_concurrent(1)
            .with_batch_size(5)
            .with_requires([ExternalResource::Llm, ExternalResource::Store])
    }
}

fn store_error(err: shared_types::StoreError) -> JobError {
    match err {
        shared_types::StoreError::Unavailable(msg) => JobError::ResourceUnavailable(msg),
        other => JobError::Fatal(other.to_string()),
    }
}

#[async_trait]
impl Task for ProposalEvaluatorTask {
    async fn should_run(&self, _ctx: &JobContext) -> Result<bool, JobError> {
        let pending = self
            .store
            .list_unevaluated_proposals(1)
            .await
            .map_err(store_error)?;
        Ok(!pending.is_empty())
    }

    async fn execute(&self, ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError> {
        let pending = self
            .store
            .list_unevaluated_proposals(ctx.batch_size)
            .await
            .map_err(store_error)?;

        let mut outcomes = Vec::with_capacity(pending.len());
        for proposal in &pending {
            match self.evaluator.evaluate(proposal).await {
                Ok(evaluation) => {
                    self.store
                        .update_proposal(
                            proposal.id,
                            ProposalUpdate {
                                evaluation_score: Some(evaluation.score),
                                evaluation_decision: Some(evaluation.decision),
                                evaluation_flags: Some(evaluation.flags.clone()),
                                evaluation_summary: Some(evaluation.summary.clone()),
                                ..ProposalUpdate::default()
                            },
                        )
                        .await
                        .map_err(store_error)?;
                    info!(
                        proposal_id = %proposal.id,
                        score = evaluation.score,
                        decision = evaluation.decision,
                        "proposal evaluated"
                    );
                    outcomes.push(JobOutcome::ok_with(
                        format!("evaluated proposal {}", proposal.id),
                        json!({ "proposal_id": proposal.id, "score": evaluation.score }),
                    ));
                }
                Err(EvaluatorError::Unavailable(msg)) if outcomes.is_empty() => {
                    // Nothing committed yet: fail the invocation so the
                    // retry policy gets a clean re-run.
                    return Err(JobError::ResourceUnavailable(msg));
                }
                Err(err) => {
                    warn!(proposal_id = %proposal.id, error = %err, "evaluation failed");
                    let job_err = JobError::Transient(err.to_string());
                    outcomes.push(JobOutcome::failed(
                        format!("evaluation failed for proposal {}", proposal.id),
                        &job_err,
                    ));
                }
            }
        }
        Ok(outcomes)
    }
}
