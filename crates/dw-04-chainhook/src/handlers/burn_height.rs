//! # Proposal Burn-Height Handler
//!
//! Records the burn-block vote window a scheduling contract call
//! reports. Idempotent by value equality: replaying the same event
//! writes the same heights.

use crate::dispatch::{EventHandler, TxContext};
use crate::errors::HandlerError;
use crate::handlers::proposal_conclude::conclusion_key;
use crate::handlers::resolve_extension;
use async_trait::async_trait;
use dw_01_store_gateway::{ProposalUpdate, Store};
use std::sync::Arc;
use tracing::{info, warn};

/// Updates `burn_start_height` / `burn_end_height` on proposals.
pub struct ProposalBurnHeightHandler {
    store: Arc<dyn Store>,
}

impl ProposalBurnHeightHandler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn window_print(ctx: &TxContext<'_>) -> Option<crate::dispatch::PrintEvent> {
        ctx.print_events().into_iter().find(|p| {
            p.envelope.u64_field("burnStartHeight").is_some()
                && p.envelope.u64_field("burnEndHeight").is_some()
        })
    }
}

#[async_trait]
impl EventHandler for ProposalBurnHeightHandler {
    fn name(&self) -> &'static str {
        "proposal_burn_height"
    }

    fn can_handle(&self, ctx: &TxContext<'_>) -> bool {
        ctx.success() && ctx.contract_call().is_some() && Self::window_print(ctx).is_some()
    }

    async fn handle(&self, ctx: &TxContext<'_>) -> Result<(), HandlerError> {
        let Some(call) = ctx.contract_call() else {
            return Ok(());
        };
        let Some(extension) = resolve_extension(&self.store, &call.contract_identifier).await?
        else {
            return Ok(());
        };
        let Some(print) = Self::window_print(ctx) else {
            return Ok(());
        };
        let Some((kind, key)) = conclusion_key(&print) else {
            warn!(tx_id = %ctx.tx_id(), "burn window event without proposal identity");
            return Ok(());
        };

        // Presence checked in window_print.
        let (Some(start), Some(end)) = (
            print.envelope.u64_field("burnStartHeight"),
            print.envelope.u64_field("burnEndHeight"),
        ) else {
            return Ok(());
        };

        let Some(proposal) = self
            .store
            .get_proposal_by_key(extension.dao_id, kind, &key)
            .await?
        else {
            warn!(dao_id = %extension.dao_id, key = %key, "burn window for unknown proposal");
            return Ok(());
        };

        if proposal.burn_start_height == Some(start) && proposal.burn_end_height == Some(end) {
            return Ok(());
        }

        self.store
            .update_proposal(
                proposal.id,
                ProposalUpdate {
                    burn_start_height: Some(start),
                    burn_end_height: Some(end),
                    ..ProposalUpdate::default()
                },
            )
            .await?;
        info!(proposal_id = %proposal.id, start, end, "proposal burn window set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::TxContext;
    use crate::testkit::{block, seed_dao, TxBuilder};
    use dw_01_store_gateway::{MemoryStore, NewProposal};
    use serde_json::json;
    use shared_types::{ProposalKey, ProposalKind, ProposalStatus};

    const EXT: &str = "SP123.action-proposals";

    #[tokio::test]
    async fn test_window_recorded_and_idempotent() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (dao, _) = seed_dao(&store, EXT).await;
        store
            .create_proposal(NewProposal {
                dao_id: dao.id,
                kind: ProposalKind::Action,
                on_chain_id: Some(42),
                contract_principal: None,
                title: String::new(),
                content: String::new(),
                creator: "SP000A".to_string(),
                tx_id: "0xcreate".to_string(),
                status: ProposalStatus::Active,
                created_at: None,
            })
            .await
            .unwrap();
        let handler = ProposalBurnHeightHandler::new(Arc::clone(&store));

        let tx = TxBuilder::contract_call("0xsched", EXT, "propose-action")
            .print_event(
                EXT,
                "propose-action",
                json!({ "proposalId": 42, "burnStartHeight": 800_100, "burnEndHeight": 800_244 }),
            )
            .build();
        let b = block(101, vec![tx]);
        let ctx = TxContext {
            block: &b,
            tx: &b.transactions[0],
        };
        assert!(handler.can_handle(&ctx));
        handler.handle(&ctx).await.unwrap();
        handler.handle(&ctx).await.unwrap();

        let updated = store
            .get_proposal_by_key(dao.id, ProposalKind::Action, &ProposalKey::OnChainId(42))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.burn_start_height, Some(800_100));
        assert_eq!(updated.burn_end_height, Some(800_244));
    }

    #[tokio::test]
    async fn test_print_without_window_not_claimed() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let _ = seed_dao(&store, EXT).await;
        let handler = ProposalBurnHeightHandler::new(Arc::clone(&store));

        let tx = TxBuilder::contract_call("0xplain", EXT, "propose-action")
            .print_event(EXT, "propose-action", json!({ "proposalId": 42 }))
            .build();
        let b = block(101, vec![tx]);
        let ctx = TxContext {
            block: &b,
            tx: &b.transactions[0],
        };
        assert!(!handler.can_handle(&ctx));
    }
}
