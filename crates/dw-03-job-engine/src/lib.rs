//! # Job Engine (Subsystem 3)
//!
//! Metadata-driven background job execution:
//!
//! - `metadata` - task contracts: type key, interval, priority, caps,
//!   retry policy, required resources
//! - `task` - the `Task` trait (phase methods) and per-unit outcomes
//! - `registry` - the process-wide `task_type -> (task, metadata)` map
//! - `executor` - runs one invocation end-to-end: validation phases,
//!   timeout, retry with exponential backoff, concurrency caps, metrics,
//!   dead-letter capture
//! - `scheduler` - the cooperative tick loop firing tasks at their
//!   configured intervals in priority order
//!
//! ## Flow
//!
//! ```text
//! register()          tick (1s)
//!    │                   │
//!    ▼                   ▼
//! ┌──────────┐     ┌───────────┐    dispatch    ┌──────────┐
//! │ Registry │ ──► │ Scheduler │ ─────────────► │ Executor │ ──► Task
//! └──────────┘     └───────────┘  (≤1/type/tick)└──────────┘
//! ```
//!
//! The registry and the dispatcher handler list are populated at startup
//! and read-only thereafter; per-type in-flight counts are atomics shared
//! between scheduler and executor.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod dead_letter;
pub mod errors;
pub mod executor;
pub mod metadata;
pub mod metrics;
pub mod registry;
pub mod scheduler;
pub mod task;

pub use config::{JobSchedulerConfig, TaskOverride};
pub use dead_letter::{DeadLetter, DeadLetterQueue};
pub use errors::{JobError, RegistryError};
pub use executor::{ExecutionDisposition, JobExecution, JobExecutor};
pub use metadata::{ExternalResource, JobPriority, TaskMetadata};
pub use metrics::{MetricsRegistry, TaskMetricsSnapshot};
pub use registry::{RegisteredTask, TaskRegistry};
pub use scheduler::Scheduler;
pub use task::{JobContext, JobOutcome, Task};
