//! # DAOWatch Test Suite
//!
//! Cross-subsystem integration scenarios:
//!
//! ```text
//! tests/src/integration/
//! ├── proposal_lifecycle.rs   # create -> vote -> conclude, with replays
//! ├── chain_catch_up.rs       # monitor replaying missed blocks
//! └── job_engine.rs           # retry budgets and concurrency caps
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dw-tests
//! cargo test -p dw-tests integration::proposal_lifecycle::
//! ```

#![allow(dead_code)]

pub mod integration;
