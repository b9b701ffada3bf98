//! # Scheduler
//!
//! One cooperative loop firing task executions at their metadata
//! intervals. Each tick walks the enabled task types in priority order
//! and dispatches at most one invocation per type; admission against the
//! per-type concurrency cap is the executor's call, so capped dispatches
//! surface in the `busy` metric rather than queueing.
//!
//! Configuration reloads swap enablement and intervals without touching
//! in-flight work. Shutdown stops dispatching, drains in-flight
//! invocations within the configured grace period, then aborts the rest.

use crate::config::JobSchedulerConfig;
use crate::executor::JobExecutor;
use crate::registry::TaskRegistry;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Time-driven dispatcher over the task registry.
pub struct Scheduler {
    registry: Arc<TaskRegistry>,
    executor: Arc<JobExecutor>,
    config: RwLock<JobSchedulerConfig>,
    last_started: Mutex<HashMap<String, Instant>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        registry: Arc<TaskRegistry>,
        executor: Arc<JobExecutor>,
        config: JobSchedulerConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            registry,
            executor,
            config: RwLock::new(config),
            last_started: Mutex::new(HashMap::new()),
            shutdown_tx,
        }
    }

    /// Replace the scheduling configuration. In-flight executions are
    /// not interrupted; the next tick sees the new view.
    pub fn reload(&self, config: JobSchedulerConfig) {
        info!("scheduler configuration reloaded");
        *self.config.write() = config;
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> JobSchedulerConfig {
        self.config.read().clone()
    }

    /// Signal the loop to stop dispatching and drain.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Run the tick loop until shutdown, then drain.
    pub async fn run(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow_and_update() {
            info!("scheduler stopped before start");
            return;
        }
        let tick_period = self.config.read().tick;
        let mut ticker = interval(tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: JoinSet<()> = JoinSet::new();
        info!(tick_secs = tick_period.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(&mut in_flight);
                    // Reap finished invocations without blocking the loop.
                    while let Some(result) = in_flight.try_join_next() {
                        if let Err(err) = result {
                            if err.is_panic() {
                                warn!(error = %err, "task invocation panicked");
                            }
                        }
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        self.drain(in_flight).await;
    }

    /// One scheduling pass: dispatch every enabled, due task type whose
    /// cap has room. At most one invocation per type per tick.
    fn tick(&self, in_flight: &mut JoinSet<()>) {
        let config = self.config.read().clone();
        let now = Instant::now();

        for entry in self.registry.enabled(&config) {
            let task_type = entry.metadata.task_type.clone();
            let interval = config.interval_for(&entry.metadata);
            if interval.is_zero() {
                continue;
            }

            let due = self
                .last_started
                .lock()
                .get(&task_type)
                .map_or(true, |last| now.duration_since(*last) >= interval);
            if !due {
                continue;
            }

            // Admission is the executor's decision; a full cap counts as
            // a busy drop and the type stays due for the next tick.
            let Some(slot) = self.executor.try_begin(&entry) else {
                continue;
            };
            self.last_started.lock().insert(task_type.clone(), now);
            debug!(task_type = %task_type, "dispatching task");

            let executor = Arc::clone(&self.executor);
            in_flight.spawn(async move {
                let _ = executor.run_with_slot(slot, &entry).await;
            });
        }
    }

    async fn drain(&self, mut in_flight: JoinSet<()>) {
        let grace = self.config.read().shutdown_grace;
        let outstanding = in_flight.len();
        if outstanding > 0 {
            info!(outstanding, grace_secs = grace.as_secs(), "draining in-flight work");
        }
        let drained = timeout(grace, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                remaining = in_flight.len(),
                "shutdown grace elapsed, aborting remaining invocations"
            );
            in_flight.abort_all();
            while in_flight.join_next().await.is_some() {}
        }
        info!("scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dead_letter::DeadLetterQueue;
    use crate::errors::JobError;
    use crate::metadata::{JobPriority, TaskMetadata};
    use crate::metrics::MetricsRegistry;
    use crate::task::{JobContext, JobOutcome, Task};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct Counting {
        calls: Arc<AtomicU32>,
        hold: Duration,
    }

    #[async_trait]
    impl Task for Counting {
        async fn execute(&self, _ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.hold.is_zero() {
                tokio::time::sleep(self.hold).await;
            }
            Ok(vec![JobOutcome::ok("ran")])
        }
    }

    fn harness() -> (Arc<TaskRegistry>, Arc<JobExecutor>) {
        let registry = Arc::new(TaskRegistry::new());
        let executor = Arc::new(JobExecutor::new(
            Arc::new(MetricsRegistry::new()),
            Arc::new(DeadLetterQueue::new()),
        ));
        (registry, executor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_dispatch() {
        let (registry, executor) = harness();
        let calls = Arc::new(AtomicU32::new(0));
        registry
            .register(
                TaskMetadata::new("fast", "Fast").with_interval(Duration::from_secs(2)),
                Arc::new(Counting {
                    calls: calls.clone(),
                    hold: Duration::ZERO,
                }),
            )
            .unwrap();

        let scheduler = Arc::new(Scheduler::new(
            registry,
            executor,
            JobSchedulerConfig::default(),
        ));
        let handle = tokio::spawn(Arc::clone(&scheduler).run());

        tokio::time::sleep(Duration::from_millis(6500)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        // Due at t=0s, 2s, 4s, 6s within the 6.5s window.
        let observed = calls.load(Ordering::SeqCst);
        assert!((3..=4).contains(&observed), "observed {observed} runs");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_never_scheduled() {
        let (registry, executor) = harness();
        let calls = Arc::new(AtomicU32::new(0));
        registry
            .register(
                TaskMetadata::new("manual", "Manual").with_interval(Duration::ZERO),
                Arc::new(Counting {
                    calls: calls.clone(),
                    hold: Duration::ZERO,
                }),
            )
            .unwrap();

        let scheduler = Arc::new(Scheduler::new(
            registry,
            executor,
            JobSchedulerConfig::default(),
        ));
        let handle = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::sleep(Duration::from_secs(5)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_busy_drops() {
        let (registry, executor) = harness();
        let calls = Arc::new(AtomicU32::new(0));
        registry
            .register(
                TaskMetadata::new("slow", "Slow")
                    .with_interval(Duration::from_secs(1))
                    .with_max_concurrent(1),
                Arc::new(Counting {
                    calls: calls.clone(),
                    hold: Duration::from_secs(3),
                }),
            )
            .unwrap();

        let scheduler = Arc::new(Scheduler::new(
            registry,
            Arc::clone(&executor),
            JobSchedulerConfig::default(),
        ));
        let handle = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::sleep(Duration::from_secs(10)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        // A 3s body on a 1s interval with cap 1 admits at most
        // ceil(10 / 3) = 4 invocations over 10 seconds.
        let observed = calls.load(Ordering::SeqCst);
        assert!(observed <= 4, "observed {observed} runs");
        let snapshot = executor.metrics().snapshot();
        assert!(snapshot.get("slow").unwrap().dropped_busy >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_disables_task() {
        let (registry, executor) = harness();
        let calls = Arc::new(AtomicU32::new(0));
        registry
            .register(
                TaskMetadata::new("toggled", "Toggled").with_interval(Duration::from_secs(1)),
                Arc::new(Counting {
                    calls: calls.clone(),
                    hold: Duration::ZERO,
                }),
            )
            .unwrap();

        let scheduler = Arc::new(Scheduler::new(
            registry,
            executor,
            JobSchedulerConfig::default(),
        ));
        let handle = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let mut config = JobSchedulerConfig::default();
        config.set_override(
            "toggled",
            crate::config::TaskOverride {
                enabled: Some(false),
                interval: None,
            },
        );
        scheduler.reload(config);
        let before = calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(5)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_order_within_tick() {
        let (registry, executor) = harness();
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        struct Recording {
            label: &'static str,
            order: Arc<Mutex<Vec<&'static str>>>,
        }

        #[async_trait]
        impl Task for Recording {
            async fn execute(&self, _ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError> {
                self.order.lock().push(self.label);
                Ok(vec![])
            }
        }

        registry
            .register(
                TaskMetadata::new("background", "Background")
                    .with_interval(Duration::from_secs(3600))
                    .with_priority(JobPriority::Low),
                Arc::new(Recording {
                    label: "background",
                    order: order.clone(),
                }),
            )
            .unwrap();
        registry
            .register(
                TaskMetadata::new("urgent", "Urgent")
                    .with_interval(Duration::from_secs(3600))
                    .with_priority(JobPriority::Critical),
                Arc::new(Recording {
                    label: "urgent",
                    order: order.clone(),
                }),
            )
            .unwrap();

        let scheduler = Arc::new(Scheduler::new(
            registry,
            executor,
            JobSchedulerConfig::default(),
        ));
        let handle = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::sleep(Duration::from_secs(2)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        let order = order.lock();
        assert_eq!(order.as_slice(), &["urgent", "background"]);
    }
}
