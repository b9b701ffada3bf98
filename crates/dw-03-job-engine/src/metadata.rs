//! # Task Metadata
//!
//! The declarative contract a task attaches at registration: scheduling
//! interval, priority, concurrency cap, retry policy, timeout, and the
//! external resources the executor must see healthy before running it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Scheduling priority. Higher priorities are dispatched first when
/// multiple task types are due on the same tick.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    Medium,
    High,
    Critical,
}

/// External collaborators a task depends on. Resource validation runs
/// before every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalResource {
    Blockchain,
    Store,
    Llm,
    Twitter,
    Discord,
}

/// The full contract of one task type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Stable string key (`chain_state_monitor`, `proposal_evaluator`, ...).
    pub task_type: String,
    /// Human-readable name for logs.
    pub name: String,
    pub description: String,
    /// Seconds between scheduled runs; zero disables time-triggered
    /// scheduling (the task can still be run manually).
    pub interval: Duration,
    pub priority: JobPriority,
    /// Cap on concurrently running invocations of this type.
    pub max_concurrent: usize,
    /// Retries after the initial attempt; total attempts = max_retries + 1.
    pub max_retries: u32,
    /// Base backoff; attempt n sleeps `retry_delay * 2^(n-1)` before retry.
    pub retry_delay: Duration,
    /// Wall-clock budget for one execute call.
    pub timeout: Duration,
    /// Record permanently failed invocations in the dead-letter queue.
    pub dead_letter: bool,
    /// Resources validated before each attempt.
    pub requires: BTreeSet<ExternalResource>,
    /// Work-unit budget per invocation.
    pub batch_size: usize,
    /// Default enablement; configuration can override either way.
    pub enabled: bool,
}

impl TaskMetadata {
    /// Metadata with conservative defaults; chain the `with_*` methods to
    /// declare the task's contract.
    #[must_use]
    pub fn new(task_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            name: name.into(),
            description: String::new(),
            interval: Duration::from_secs(60),
            priority: JobPriority::Normal,
            max_concurrent: 1,
            max_retries: 3,
            retry_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(120),
            dead_letter: false,
            requires: BTreeSet::new(),
            batch_size: 10,
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_dead_letter(mut self, dead_letter: bool) -> Self {
        self.dead_letter = dead_letter;
        self
    }

    #[must_use]
    pub fn with_requires(mut self, resources: impl IntoIterator<Item = ExternalResource>) -> Self {
        self.requires = resources.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Total attempts one logical invocation may make.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Backoff before retrying after attempt `n` (1-based) failed.
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay.saturating_mul(factor)
    }
}
