//! # Job Engine Integration
//!
//! Retry budgets, backoff timing, and concurrency caps observed through
//! the public executor/scheduler surface under paused time.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use dw_03_job_engine::{
        DeadLetterQueue, ExecutionDisposition, JobContext, JobError, JobExecutor, JobOutcome,
        JobSchedulerConfig, MetricsRegistry, RegisteredTask, Scheduler, Task, TaskMetadata,
        TaskRegistry,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    struct SleepyTask {
        sleep: Duration,
        calls: Arc<AtomicU32>,
        started_at: Arc<parking_lot::Mutex<Vec<Duration>>>,
        epoch: Instant,
    }

    #[async_trait]
    impl Task for SleepyTask {
        async fn execute(&self, _ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started_at.lock().push(self.epoch.elapsed());
            tokio::time::sleep(self.sleep).await;
            Ok(vec![JobOutcome::ok("slept")])
        }
    }

    fn engine() -> (Arc<TaskRegistry>, Arc<JobExecutor>) {
        let registry = Arc::new(TaskRegistry::new());
        let executor = Arc::new(JobExecutor::new(
            Arc::new(MetricsRegistry::new()),
            Arc::new(DeadLetterQueue::new()),
        ));
        (registry, executor)
    }

    fn entry(registry: &TaskRegistry, task_type: &str) -> RegisteredTask {
        registry.get(task_type).expect("registered")
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_retry_backoff_schedule() {
        let (registry, executor) = engine();
        let calls = Arc::new(AtomicU32::new(0));
        let started_at = Arc::new(parking_lot::Mutex::new(Vec::new()));
        registry
            .register(
                TaskMetadata::new("sleepy", "Sleepy")
                    .with_timeout(Duration::from_secs(5))
                    .with_max_retries(3)
                    .with_retry_delay(Duration::from_secs(2))
                    .with_dead_letter(true),
                Arc::new(SleepyTask {
                    sleep: Duration::from_secs(10),
                    calls: calls.clone(),
                    started_at: started_at.clone(),
                    epoch: Instant::now(),
                }),
            )
            .unwrap();

        let execution = executor.run(&entry(&registry, "sleepy")).await;

        // Initial attempt plus three retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(execution.attempts, 4);
        assert!(matches!(
            execution.disposition,
            ExecutionDisposition::Failed(JobError::Timeout(_))
        ));

        // Attempt n starts after the previous timeouts plus backoffs
        // 2s, 4s, 8s: t = 0, 7, 16, 29.
        let starts = started_at.lock().clone();
        let expected = [0u64, 7, 16, 29];
        for (start, expected_secs) in starts.iter().zip(expected) {
            assert_eq!(start.as_secs(), expected_secs);
        }

        // Permanent failure was dead-lettered.
        assert_eq!(executor.dead_letters().len(), 1);
        let snapshot = executor.metrics().snapshot();
        let m = snapshot.get("sleepy").unwrap();
        assert_eq!(m.timed_out, 4);
        assert_eq!(m.retried, 3);
        assert_eq!(m.failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_is_k_plus_one() {
        struct AlwaysFails {
            calls: Arc<AtomicU32>,
        }

        #[async_trait]
        impl Task for AlwaysFails {
            async fn execute(&self, _ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(JobError::Transient("always".to_string()))
            }
        }

        for max_retries in [0u32, 1, 3] {
            let (registry, executor) = engine();
            let calls = Arc::new(AtomicU32::new(0));
            registry
                .register(
                    TaskMetadata::new("failing", "Failing")
                        .with_max_retries(max_retries)
                        .with_retry_delay(Duration::from_millis(10)),
                    Arc::new(AlwaysFails {
                        calls: calls.clone(),
                    }),
                )
                .unwrap();
            executor.run(&entry(&registry, "failing")).await;
            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_respects_concurrency_cap() {
        let (registry, executor) = engine();
        let calls = Arc::new(AtomicU32::new(0));
        let started_at = Arc::new(parking_lot::Mutex::new(Vec::new()));
        registry
            .register(
                TaskMetadata::new("capped", "Capped")
                    .with_interval(Duration::from_secs(1))
                    .with_max_concurrent(1)
                    .with_timeout(Duration::from_secs(60)),
                Arc::new(SleepyTask {
                    sleep: Duration::from_secs(3),
                    calls: calls.clone(),
                    started_at,
                    epoch: Instant::now(),
                }),
            )
            .unwrap();

        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&registry),
            Arc::clone(&executor),
            JobSchedulerConfig::default(),
        ));
        let handle = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::sleep(Duration::from_secs(10)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        // A 3s body on a 1s interval with cap 1: at most ceil(10/3) = 4
        // admissions in 10 seconds; the rest were dropped busy.
        let observed = calls.load(Ordering::SeqCst);
        assert!(observed <= 4, "observed {observed} invocations");
        assert!(observed >= 2, "observed only {observed} invocations");
        let snapshot = executor.metrics().snapshot();
        assert!(snapshot.get("capped").unwrap().dropped_busy >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_never_exceeds_cap() {
        struct Gauge {
            current: Arc<AtomicU32>,
            peak: Arc<AtomicU32>,
        }

        #[async_trait]
        impl Task for Gauge {
            async fn execute(&self, _ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError> {
                let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                self.current.fetch_sub(1, Ordering::SeqCst);
                Ok(vec![])
            }
        }

        let (registry, executor) = engine();
        let peak = Arc::new(AtomicU32::new(0));
        registry
            .register(
                TaskMetadata::new("gauged", "Gauged")
                    .with_interval(Duration::from_secs(1))
                    .with_max_concurrent(2)
                    .with_timeout(Duration::from_secs(60)),
                Arc::new(Gauge {
                    current: Arc::new(AtomicU32::new(0)),
                    peak: peak.clone(),
                }),
            )
            .unwrap();

        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&registry),
            Arc::clone(&executor),
            JobSchedulerConfig::default(),
        ));
        let handle = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::sleep(Duration::from_secs(20)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
