//! # Job Executor
//!
//! Runs a single task invocation end-to-end: concurrency admission,
//! the five execution phases, timeout enforcement, retry with
//! exponential backoff, metrics, and dead-letter capture.
//!
//! ## Phases
//!
//! 1. `validate_config` - non-retriable on failure
//! 2. `validate_resources` - retriable on failure
//! 3. `should_run` - `false` is a clean no-op
//! 4. `execute` - bounded by `metadata.timeout`
//! 5. `cleanup` - always awaited, even on failure
//!
//! ## Admission
//!
//! At most `metadata.max_concurrent` invocations of one task type run at
//! a time; overflow is dropped (never queued) and counted in the `busy`
//! metric.

use crate::dead_letter::{DeadLetter, DeadLetterQueue};
use crate::errors::JobError;
use crate::metrics::MetricsRegistry;
use crate::registry::RegisteredTask;
use crate::task::{JobContext, JobOutcome};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How an invocation ended.
#[derive(Debug, Clone)]
pub enum ExecutionDisposition {
    /// Execute completed and returned outcomes.
    Completed,
    /// `should_run` declined; nothing was executed.
    NoOp,
    /// The per-type concurrency cap was hit; the invocation was dropped.
    DroppedBusy,
    /// All attempts failed; carries the final error.
    Failed(JobError),
}

/// Record of one logical invocation.
#[derive(Debug, Clone)]
pub struct JobExecution {
    pub task_type: String,
    pub correlation_id: Uuid,
    /// Execute calls actually made.
    pub attempts: u32,
    pub outcomes: Vec<JobOutcome>,
    pub disposition: ExecutionDisposition,
}

impl JobExecution {
    /// True when the invocation completed (including clean no-ops).
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(
            self.disposition,
            ExecutionDisposition::Completed | ExecutionDisposition::NoOp
        )
    }
}

/// Held slot against a task type's concurrency cap; releases on drop.
pub struct ConcurrencySlot {
    counter: Arc<AtomicUsize>,
}

impl Drop for ConcurrencySlot {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

enum AttemptOutput {
    Skipped,
    Done(Vec<JobOutcome>),
}

/// Executes task invocations against their metadata contracts.
pub struct JobExecutor {
    metrics: Arc<MetricsRegistry>,
    dead_letters: Arc<DeadLetterQueue>,
    in_flight: DashMap<String, Arc<AtomicUsize>>,
}

impl JobExecutor {
    #[must_use]
    pub fn new(metrics: Arc<MetricsRegistry>, dead_letters: Arc<DeadLetterQueue>) -> Self {
        Self {
            metrics,
            dead_letters,
            in_flight: DashMap::new(),
        }
    }

    /// Shared metrics registry.
    #[must_use]
    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    /// Shared dead-letter queue.
    #[must_use]
    pub fn dead_letters(&self) -> Arc<DeadLetterQueue> {
        Arc::clone(&self.dead_letters)
    }

    /// Current in-flight invocations of a task type.
    #[must_use]
    pub fn in_flight(&self, task_type: &str) -> usize {
        self.in_flight
            .get(task_type)
            .map_or(0, |c| c.load(Ordering::SeqCst))
    }

    fn counter(&self, task_type: &str) -> Arc<AtomicUsize> {
        self.in_flight
            .entry(task_type.to_string())
            .or_default()
            .clone()
    }

    /// Try to claim a concurrency slot; `None` means the cap is hit and
    /// the caller must drop the invocation.
    #[must_use]
    pub fn try_begin(&self, entry: &RegisteredTask) -> Option<ConcurrencySlot> {
        let counter = self.counter(&entry.metadata.task_type);
        let admitted = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < entry.metadata.max_concurrent).then_some(current + 1)
            })
            .is_ok();
        if admitted {
            Some(ConcurrencySlot { counter })
        } else {
            self.metrics
                .for_task(&entry.metadata.task_type)
                .dropped_busy
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                task_type = %entry.metadata.task_type,
                cap = entry.metadata.max_concurrent,
                "invocation dropped: concurrency cap reached"
            );
            None
        }
    }

    /// Run one invocation, claiming a slot first. Returns `DroppedBusy`
    /// without executing anything when the cap is hit.
    pub async fn run(&self, entry: &RegisteredTask) -> JobExecution {
        match self.try_begin(entry) {
            Some(slot) => self.run_with_slot(slot, entry).await,
            None => JobExecution {
                task_type: entry.metadata.task_type.clone(),
                correlation_id: Uuid::new_v4(),
                attempts: 0,
                outcomes: Vec::new(),
                disposition: ExecutionDisposition::DroppedBusy,
            },
        }
    }

    /// Run one invocation holding an already-claimed slot.
    pub async fn run_with_slot(
        &self,
        slot: ConcurrencySlot,
        entry: &RegisteredTask,
    ) -> JobExecution {
        // Slot is released when this scope ends, whatever the outcome.
        let _slot = slot;

        let metadata = &entry.metadata;
        let metrics = self.metrics.for_task(&metadata.task_type);
        let correlation_id = Uuid::new_v4();
        let max_attempts = metadata.max_attempts();
        let mut attempt = 1u32;

        loop {
            let ctx = JobContext {
                task_type: metadata.task_type.clone(),
                attempt,
                max_attempts,
                batch_size: metadata.batch_size,
                correlation_id,
            };
            metrics.started.fetch_add(1, Ordering::Relaxed);

            match self.run_once(entry, &ctx).await {
                Ok(AttemptOutput::Skipped) => {
                    metrics.no_op.fetch_add(1, Ordering::Relaxed);
                    debug!(task_type = %metadata.task_type, %correlation_id, "nothing to do");
                    return JobExecution {
                        task_type: metadata.task_type.clone(),
                        correlation_id,
                        attempts: attempt - 1,
                        outcomes: Vec::new(),
                        disposition: ExecutionDisposition::NoOp,
                    };
                }
                Ok(AttemptOutput::Done(outcomes)) => {
                    metrics.succeeded.fetch_add(1, Ordering::Relaxed);
                    info!(
                        task_type = %metadata.task_type,
                        %correlation_id,
                        attempt,
                        units = outcomes.len(),
                        "invocation completed"
                    );
                    return JobExecution {
                        task_type: metadata.task_type.clone(),
                        correlation_id,
                        attempts: attempt,
                        outcomes,
                        disposition: ExecutionDisposition::Completed,
                    };
                }
                Err(err) => {
                    if matches!(err, JobError::Timeout(_)) {
                        metrics.timed_out.fetch_add(1, Ordering::Relaxed);
                    }
                    let retriable = entry.task.is_retriable(&err);
                    if retriable && attempt < max_attempts {
                        let backoff = metadata.backoff_after(attempt);
                        metrics.retried.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            task_type = %metadata.task_type,
                            %correlation_id,
                            attempt,
                            error = %err,
                            backoff_secs = backoff.as_secs(),
                            "attempt failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }

                    metrics.failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        task_type = %metadata.task_type,
                        %correlation_id,
                        attempts = attempt,
                        error = %err,
                        retriable,
                        "invocation failed"
                    );
                    if metadata.dead_letter {
                        metrics.dead_lettered.fetch_add(1, Ordering::Relaxed);
                        self.dead_letters.push(DeadLetter {
                            task_type: metadata.task_type.clone(),
                            correlation_id,
                            attempts: attempt,
                            error_kind: err.kind().to_string(),
                            error_message: err.to_string(),
                            failed_at: Utc::now(),
                        });
                    }
                    return JobExecution {
                        task_type: metadata.task_type.clone(),
                        correlation_id,
                        attempts: attempt,
                        outcomes: Vec::new(),
                        disposition: ExecutionDisposition::Failed(err),
                    };
                }
            }
        }
    }

    async fn run_once(
        &self,
        entry: &RegisteredTask,
        ctx: &JobContext,
    ) -> Result<AttemptOutput, JobError> {
        let task = &entry.task;
        let metadata = &entry.metadata;

        task.validate_config(ctx).await?;
        task.validate_resources(ctx).await?;

        if !task.should_run(ctx).await? {
            task.cleanup(ctx, None).await;
            return Ok(AttemptOutput::Skipped);
        }

        let result = match timeout(metadata.timeout, task.execute(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(JobError::Timeout(metadata.timeout)),
        };

        match result {
            Ok(outcomes) => {
                task.cleanup(ctx, Some(&outcomes)).await;
                Ok(AttemptOutput::Done(outcomes))
            }
            Err(err) => {
                task.cleanup(ctx, None).await;
                Err(err)
            }
        }
    }
}
