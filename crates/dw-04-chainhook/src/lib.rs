//! # Chainhook Ingestion (Subsystem 4)
//!
//! The webhook ingestion pipeline: parse block-transaction payloads into
//! the typed transaction model, dispatch each transaction to the handler
//! chain, and mutate DAO, proposal, and vote state idempotently.
//!
//! ```text
//! webhook ─► parser ─► dispatcher ─► handlers ─► store
//! ```
//!
//! Payloads arrive either from the external chainhook service or
//! synthesized by the chain-state monitor; both take the same path.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod dispatch;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod testkit;
pub mod webhooks;

pub use dispatch::{ChainhookDispatcher, DispatchSummary, EventHandler, PrintEvent, TxContext};
pub use errors::{HandlerError, ParseError};
pub use models::{
    ApplyBlock, BlockIdentifier, BlockMetadata, ChainhookInfo, ChainhookPayload, ContractCallKind,
    EventPayload, ExecutionCost, FtTransferData, Operation, Position, PrintEnvelope, Receipt,
    ReceiptEvent, SmartContractEventData, TransactionIdentifier, TransactionKind,
    TransactionMetadata, TransactionWithReceipt,
};
pub use parser::ChainhookParser;
pub use webhooks::{
    ChainhookService, DaoWebhookService, WebhookHandler, WebhookParser, WebhookResponse,
    WebhookService,
};
