//! # DAOWatch Runtime
//!
//! Configuration and wiring for the daemon: builds the application
//! context (store, chain client, dispatcher, webhook services, job
//! engine), validates startup, and runs until shutdown.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod context;

pub use config::{ConfigError, RuntimeConfig};
pub use context::{AppContext, AppContextBuilder, StartupError};
