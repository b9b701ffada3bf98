//! # Chainhook Parser
//!
//! Converts raw webhook payloads into [`ChainhookPayload`]. Side-effect
//! free and deterministic: the same input always yields the same model.
//! Unknown transaction kinds and event types survive as `Unknown`
//! variants (logged, never rejected); missing required fields reject the
//! payload as malformed.

use crate::errors::ParseError;
use crate::models::{ChainhookPayload, EventPayload, TransactionKind};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

/// Parser for chainhook webhook payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainhookParser;

impl ChainhookParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw payload.
    pub fn parse(&self, raw: &Value) -> Result<ChainhookPayload, ParseError> {
        if raw.get("apply").is_none() {
            let correlation_id = Uuid::new_v4();
            warn!(%correlation_id, payload = %raw, "payload missing apply array");
            return Err(ParseError::MalformedPayload("apply".to_string()));
        }

        let payload: ChainhookPayload = serde_json::from_value(raw.clone()).map_err(|e| {
            let correlation_id = Uuid::new_v4();
            warn!(%correlation_id, error = %e, payload = %raw, "malformed chainhook payload");
            ParseError::MalformedPayload(e.to_string())
        })?;

        for block in payload.apply.iter().chain(payload.rollback.iter()) {
            for tx in &block.transactions {
                if let TransactionKind::Unknown { kind_type, .. } = &tx.metadata.kind {
                    debug!(
                        tx_id = %tx.transaction_identifier.hash,
                        kind = %kind_type,
                        "unknown transaction kind, dispatching with raw fields"
                    );
                }
                for event in &tx.metadata.receipt.events {
                    if let EventPayload::Unknown { event_type, .. } = &event.payload {
                        debug!(
                            tx_id = %tx.transaction_identifier.hash,
                            event_type = %event_type,
                            "unknown receipt event type"
                        );
                    }
                }
            }
        }

        Ok(payload)
    }
}
