//! # Chainhook Dispatcher
//!
//! Invokes each handler that claims a transaction, in registration
//! order, independently per handler.
//!
//! Ordering guarantees, within one dispatch call:
//! - blocks in `apply` array order
//! - transactions within a block in `tx_index` order
//! - handlers per transaction in registration order
//!
//! A handler failure is caught and logged; it never prevents subsequent
//! handlers from running and never aborts the block. Rollback blocks are
//! delivered after apply through `handle_rollback`.

use crate::models::{
    ApplyBlock, ChainhookPayload, ContractCallKind, EventPayload, PrintEnvelope, ReceiptEvent,
    TransactionWithReceipt,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// A decoded `print` event, as handlers consume it.
#[derive(Debug, Clone)]
pub struct PrintEvent {
    pub index: u32,
    pub contract_identifier: String,
    pub envelope: PrintEnvelope,
}

/// One transaction in the context of its block.
pub struct TxContext<'a> {
    pub block: &'a ApplyBlock,
    pub tx: &'a TransactionWithReceipt,
}

impl TxContext<'_> {
    /// Transaction hash.
    #[must_use]
    pub fn tx_id(&self) -> &str {
        &self.tx.transaction_identifier.hash
    }

    /// Transaction sender principal.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.tx.metadata.sender
    }

    /// Whether the chain accepted the transaction.
    #[must_use]
    pub fn success(&self) -> bool {
        self.tx.metadata.success
    }

    /// Contract call data when this transaction is a call.
    #[must_use]
    pub fn contract_call(&self) -> Option<&ContractCallKind> {
        self.tx.metadata.kind.as_contract_call()
    }

    /// Called method name, for calls.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.contract_call().map(|c| c.method.as_str())
    }

    /// Receipt events in position order.
    #[must_use]
    pub fn events(&self) -> &[ReceiptEvent] {
        &self.tx.metadata.receipt.events
    }

    /// Decoded `print` events with a structured notification envelope.
    #[must_use]
    pub fn print_events(&self) -> Vec<PrintEvent> {
        let mut prints: Vec<PrintEvent> = self
            .events()
            .iter()
            .filter_map(|event| {
                let EventPayload::SmartContract(data) = &event.payload else {
                    return None;
                };
                data.print_envelope().map(|envelope| PrintEvent {
                    index: event.index,
                    contract_identifier: data.contract_identifier.clone(),
                    envelope,
                })
            })
            .collect();
        prints.sort_by_key(|p| p.index);
        prints
    }

    /// First print event carrying one of the given notifications.
    #[must_use]
    pub fn first_print(&self, notifications: &[&str]) -> Option<PrintEvent> {
        self.print_events()
            .into_iter()
            .find(|p| notifications.contains(&p.envelope.notification.as_str()))
    }

    /// Best-known block time for this transaction.
    #[must_use]
    pub fn block_time(&self) -> Option<i64> {
        self.block.block_time()
    }
}

/// A specialized, idempotent event handler.
///
/// Replaying the same transaction must produce the same persistent
/// state.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name for logs.
    fn name(&self) -> &'static str;

    /// Whether this handler claims the transaction.
    fn can_handle(&self, ctx: &TxContext<'_>) -> bool;

    /// Process a claimed transaction.
    async fn handle(&self, ctx: &TxContext<'_>) -> Result<(), crate::errors::HandlerError>;

    /// Whether this handler wants every block (independent of
    /// transactions).
    fn handles_block(&self) -> bool {
        false
    }

    /// Process one applied block.
    async fn handle_block(&self, _block: &ApplyBlock) -> Result<(), crate::errors::HandlerError> {
        Ok(())
    }

    /// Process a rolled-back transaction. Delivery only; handlers are
    /// no-ops unless they opt in.
    async fn handle_rollback(
        &self,
        ctx: &TxContext<'_>,
    ) -> Result<(), crate::errors::HandlerError> {
        debug!(handler = self.name(), tx_id = %ctx.tx_id(), "rollback delivered");
        Ok(())
    }
}

/// Counts returned to the webhook surface after a dispatch.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct DispatchSummary {
    pub blocks: usize,
    pub transactions: usize,
    /// Handler invocations that claimed and processed a transaction.
    pub handled: usize,
    /// Handler invocations that failed (contained, logged).
    pub failures: usize,
    pub rollback_blocks: usize,
}

/// Orders handler invocation over parsed payloads.
pub struct ChainhookDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl ChainhookDispatcher {
    /// Build with the handler chain in registration order. The list is
    /// fixed for the process lifetime.
    #[must_use]
    pub fn new(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        Self { handlers }
    }

    /// Registered handler count.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch one parsed payload.
    pub async fn dispatch(&self, payload: &ChainhookPayload) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for block in &payload.apply {
            summary.blocks += 1;

            for handler in &self.handlers {
                if !handler.handles_block() {
                    continue;
                }
                if let Err(err) = handler.handle_block(block).await {
                    summary.failures += 1;
                    error!(
                        handler = handler.name(),
                        height = block.block_identifier.index,
                        error = %err,
                        "block handler failed"
                    );
                } else {
                    summary.handled += 1;
                }
            }

            // Deliver transactions in tx_index order regardless of array
            // order in the payload.
            let mut transactions: Vec<&TransactionWithReceipt> =
                block.transactions.iter().collect();
            transactions.sort_by_key(|tx| tx.metadata.position.index);

            for tx in transactions {
                summary.transactions += 1;
                let ctx = TxContext { block, tx };
                for handler in &self.handlers {
                    if !handler.can_handle(&ctx) {
                        continue;
                    }
                    debug!(handler = handler.name(), tx_id = %ctx.tx_id(), "handling transaction");
                    match handler.handle(&ctx).await {
                        Ok(()) => summary.handled += 1,
                        Err(err) => {
                            summary.failures += 1;
                            error!(
                                handler = handler.name(),
                                tx_id = %ctx.tx_id(),
                                error = %err,
                                "handler failed; continuing"
                            );
                        }
                    }
                }
            }
        }

        for block in &payload.rollback {
            summary.rollback_blocks += 1;
            let mut transactions: Vec<&TransactionWithReceipt> =
                block.transactions.iter().collect();
            transactions.sort_by_key(|tx| tx.metadata.position.index);

            for tx in transactions {
                let ctx = TxContext { block, tx };
                for handler in &self.handlers {
                    if !handler.can_handle(&ctx) {
                        continue;
                    }
                    if let Err(err) = handler.handle_rollback(&ctx).await {
                        summary.failures += 1;
                        error!(
                            handler = handler.name(),
                            tx_id = %ctx.tx_id(),
                            error = %err,
                            "rollback handler failed; continuing"
                        );
                    }
                }
            }
        }

        summary
    }
}
