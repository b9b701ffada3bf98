//! # Blockchain Client (Subsystem 2)
//!
//! Read access to the chain API: tip info, block metadata, and
//! block transactions, plus outbound chainhook registration.
//!
//! ## Architecture
//!
//! - `ports` - the `ChainApi` trait the rest of the system consumes
//! - `models` - response shapes for the three required endpoints
//! - `http` - reqwest adapter against a Hiro-style API
//! - `mock` - scripted adapter for tests
//! - `hooks` - chainhook predicate builder and registration client

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod errors;
pub mod hooks;
pub mod http;
pub mod mock;
pub mod models;
pub mod ports;

pub use errors::ChainApiError;
pub use hooks::{HookPredicate, PredicateBuilder, WebhookSink};
pub use http::HttpChainApi;
pub use mock::MockChainApi;
pub use models::{
    ApiInfo, BlockTransaction, ChainBlock, ChainTip, ClarityValue, ContractCallData,
    TokenTransferData, TransactionEventRecord,
};
pub use ports::ChainApi;
