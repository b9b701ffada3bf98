//! # Dead-Letter Queue
//!
//! Bounded in-memory record of invocations that exhausted their retry
//! budget, for tasks that opted in via metadata.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 1000;

/// One permanently failed invocation.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub task_type: String,
    pub correlation_id: Uuid,
    pub attempts: u32,
    /// Stable error label from the final failure.
    pub error_kind: String,
    pub error_message: String,
    pub failed_at: DateTime<Utc>,
}

/// Bounded FIFO of dead letters; oldest entries are evicted at capacity.
pub struct DeadLetterQueue {
    entries: Mutex<VecDeque<DeadLetter>>,
    capacity: usize,
}

impl DeadLetterQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record a permanently failed invocation.
    pub fn push(&self, letter: DeadLetter) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(letter);
    }

    /// Number of recorded letters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no letters are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Remove and return all recorded letters.
    #[must_use]
    pub fn drain(&self) -> Vec<DeadLetter> {
        self.entries.lock().drain(..).collect()
    }
}

impl Default for DeadLetterQueue {
    fn default() -> Self {
        Self::new()
    }
}
