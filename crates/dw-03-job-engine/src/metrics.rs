//! # Execution Metrics
//!
//! Per-task-type counters kept as atomics. Dropped invocations are
//! observable only here, so the busy counter is part of the scheduler's
//! contract, not just telemetry.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one task type.
#[derive(Debug, Default)]
pub struct TaskMetrics {
    pub started: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub retried: AtomicU64,
    pub timed_out: AtomicU64,
    pub dropped_busy: AtomicU64,
    pub dead_lettered: AtomicU64,
    pub no_op: AtomicU64,
}

/// Point-in-time copy of one task type's counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskMetricsSnapshot {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub retried: u64,
    pub timed_out: u64,
    pub dropped_busy: u64,
    pub dead_lettered: u64,
    pub no_op: u64,
}

impl TaskMetrics {
    fn snapshot(&self) -> TaskMetricsSnapshot {
        TaskMetricsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            dropped_busy: self.dropped_busy.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            no_op: self.no_op.load(Ordering::Relaxed),
        }
    }
}

/// All task metrics, keyed by task type.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    tasks: DashMap<String, Arc<TaskMetrics>>,
}

impl MetricsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for a task type, created on first touch.
    #[must_use]
    pub fn for_task(&self, task_type: &str) -> Arc<TaskMetrics> {
        self.tasks
            .entry(task_type.to_string())
            .or_default()
            .clone()
    }

    /// Snapshot every task type.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, TaskMetricsSnapshot> {
        self.tasks
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let registry = MetricsRegistry::new();
        let m = registry.for_task("monitor");
        m.started.fetch_add(2, Ordering::Relaxed);
        m.succeeded.fetch_add(1, Ordering::Relaxed);
        m.dropped_busy.fetch_add(1, Ordering::Relaxed);

        let snap = registry.snapshot();
        let monitor = snap.get("monitor").unwrap();
        assert_eq!(monitor.started, 2);
        assert_eq!(monitor.succeeded, 1);
        assert_eq!(monitor.dropped_busy, 1);
    }

    #[test]
    fn test_same_handle_for_same_type() {
        let registry = MetricsRegistry::new();
        registry.for_task("a").started.fetch_add(1, Ordering::Relaxed);
        registry.for_task("a").started.fetch_add(1, Ordering::Relaxed);
        assert_eq!(registry.snapshot().get("a").unwrap().started, 2);
    }
}
