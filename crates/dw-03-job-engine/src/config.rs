//! # Scheduler Configuration
//!
//! Runtime overrides layered on top of task metadata: enablement and
//! interval per task type. The runtime builds this from environment
//! variables; tests build it directly.

use crate::metadata::TaskMetadata;
use std::collections::HashMap;
use std::time::Duration;

/// Per-task-type override. `None` fields fall back to metadata.
#[derive(Debug, Clone, Default)]
pub struct TaskOverride {
    pub enabled: Option<bool>,
    pub interval: Option<Duration>,
}

/// Configuration the scheduler consults each tick.
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Overrides keyed by task type.
    pub overrides: HashMap<String, TaskOverride>,
    /// Grace period for in-flight work on shutdown.
    pub shutdown_grace: Duration,
    /// Tick resolution.
    pub tick: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            shutdown_grace: Duration::from_secs(30),
            tick: Duration::from_secs(1),
        }
    }
}

impl JobSchedulerConfig {
    /// Set an override for a task type.
    pub fn set_override(&mut self, task_type: impl Into<String>, value: TaskOverride) {
        self.overrides.insert(task_type.into(), value);
    }

    /// Effective enablement for a task.
    #[must_use]
    pub fn is_enabled(&self, metadata: &TaskMetadata) -> bool {
        self.overrides
            .get(&metadata.task_type)
            .and_then(|o| o.enabled)
            .unwrap_or(metadata.enabled)
    }

    /// Effective scheduling interval for a task.
    #[must_use]
    pub fn interval_for(&self, metadata: &TaskMetadata) -> Duration {
        self.overrides
            .get(&metadata.task_type)
            .and_then(|o| o.interval)
            .unwrap_or(metadata.interval)
    }

    /// Override keys that do not match any registered task type, with
    /// whether the override explicitly enables the unknown task.
    #[must_use]
    pub fn unknown_types<'a>(
        &'a self,
        known: &[&str],
    ) -> Vec<(&'a str, bool)> {
        self.overrides
            .iter()
            .filter(|(k, _)| !known.contains(&k.as_str()))
            .map(|(k, o)| (k.as_str(), o.enabled == Some(true)))
            .collect()
    }
}
