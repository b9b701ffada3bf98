//! # Task Registry
//!
//! The single source of truth mapping `task_type -> (task, metadata)`.
//! Populated declaratively at process initialization; read-only after
//! startup. Duplicate keys fail registration so a misconfigured build
//! cannot silently shadow a task.

use crate::config::JobSchedulerConfig;
use crate::errors::RegistryError;
use crate::metadata::TaskMetadata;
use crate::task::Task;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A task plus its contract, as stored in the registry.
#[derive(Clone)]
pub struct RegisteredTask {
    pub task: Arc<dyn Task>,
    pub metadata: Arc<TaskMetadata>,
    /// Registration sequence, used to break priority ties
    /// deterministically.
    pub order: usize,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, RegisteredTask>,
    next_order: usize,
}

/// Process-wide task registry.
#[derive(Default)]
pub struct TaskRegistry {
    inner: RwLock<RegistryInner>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under its metadata's type key.
    pub fn register(
        &self,
        metadata: TaskMetadata,
        task: Arc<dyn Task>,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write();
        let key = metadata.task_type.clone();
        if inner.entries.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered(key));
        }
        let order = inner.next_order;
        inner.next_order += 1;
        info!(task_type = %key, name = %metadata.name, "task registered");
        inner.entries.insert(
            key,
            RegisteredTask {
                task,
                metadata: Arc::new(metadata),
                order,
            },
        );
        Ok(())
    }

    /// Look up one task type.
    #[must_use]
    pub fn get(&self, task_type: &str) -> Option<RegisteredTask> {
        self.inner.read().entries.get(task_type).cloned()
    }

    /// All registered task types.
    #[must_use]
    pub fn task_types(&self) -> Vec<String> {
        let mut types: Vec<(usize, String)> = self
            .inner
            .read()
            .entries
            .values()
            .map(|e| (e.order, e.metadata.task_type.clone()))
            .collect();
        types.sort_by_key(|(order, _)| *order);
        types.into_iter().map(|(_, t)| t).collect()
    }

    /// All entries, priority-descending then registration-order-ascending.
    #[must_use]
    pub fn all(&self) -> Vec<RegisteredTask> {
        let mut entries: Vec<RegisteredTask> =
            self.inner.read().entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            b.metadata
                .priority
                .cmp(&a.metadata.priority)
                .then(a.order.cmp(&b.order))
        });
        entries
    }

    /// Entries enabled under `config`, in dispatch order.
    #[must_use]
    pub fn enabled(&self, config: &JobSchedulerConfig) -> Vec<RegisteredTask> {
        self.all()
            .into_iter()
            .filter(|e| config.is_enabled(&e.metadata))
            .collect()
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::JobError;
    use crate::metadata::JobPriority;
    use crate::task::{JobContext, JobOutcome};
    use async_trait::async_trait;

    struct Nop;

    #[async_trait]
    impl Task for Nop {
        async fn execute(&self, _ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError> {
            Ok(vec![])
        }
    }

    fn register(registry: &TaskRegistry, task_type: &str, priority: JobPriority) {
        registry
            .register(
                TaskMetadata::new(task_type, task_type).with_priority(priority),
                Arc::new(Nop),
            )
            .unwrap();
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = TaskRegistry::new();
        register(&registry, "monitor", JobPriority::Medium);
        let err = registry
            .register(TaskMetadata::new("monitor", "again"), Arc::new(Nop))
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(t) if t == "monitor"));
    }

    #[test]
    fn test_dispatch_order_priority_then_registration() {
        let registry = TaskRegistry::new();
        register(&registry, "low_first", JobPriority::Low);
        register(&registry, "critical", JobPriority::Critical);
        register(&registry, "high_a", JobPriority::High);
        register(&registry, "high_b", JobPriority::High);

        let order: Vec<String> = registry
            .all()
            .iter()
            .map(|e| e.metadata.task_type.clone())
            .collect();
        assert_eq!(order, vec!["critical", "high_a", "high_b", "low_first"]);
    }

    #[test]
    fn test_enabled_respects_config_override() {
        let registry = TaskRegistry::new();
        register(&registry, "a", JobPriority::Normal);
        register(&registry, "b", JobPriority::Normal);

        let mut config = JobSchedulerConfig::default();
        config.set_override(
            "a",
            crate::config::TaskOverride {
                enabled: Some(false),
                interval: None,
            },
        );
        let enabled: Vec<String> = registry
            .enabled(&config)
            .iter()
            .map(|e| e.metadata.task_type.clone())
            .collect();
        assert_eq!(enabled, vec!["b"]);
    }

    #[test]
    fn test_get_and_len() {
        let registry = TaskRegistry::new();
        assert!(registry.is_empty());
        register(&registry, "a", JobPriority::Normal);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").is_some());
        assert!(registry.get("missing").is_none());
    }
}
