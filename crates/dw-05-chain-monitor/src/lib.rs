//! # Chain-State Monitor (Subsystem 5)
//!
//! The self-healing loop: compares store chain height to the chain tip,
//! fetches missing blocks, synthesizes chainhook-compatible payloads
//! from raw transaction data, and replays them through the dispatcher.
//! Missed upstream webhook deliveries are thereby recovered without
//! operator intervention.
//!
//! Also home to the proposal evaluator task, which drains unevaluated
//! proposals through an opaque evaluator port.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod evaluator;
pub mod monitor;
pub mod synthesize;

pub use config::MonitorConfig;
pub use evaluator::{Evaluation, Evaluator, EvaluatorError, ProposalEvaluatorTask};
pub use monitor::{ChainStateMonitorResult, ChainStateMonitorTask};
pub use synthesize::{synthesize_payload, BlockFacts};
