//! # Action Concluder Handler
//!
//! The one handler that inspects multiple events of a transaction
//! jointly: a `conclude-proposal` call that also emitted an
//! `execute-action` event means the action body ran, so the proposal is
//! marked executed.

use crate::dispatch::{EventHandler, TxContext};
use crate::errors::HandlerError;
use crate::handlers::proposal_conclude::conclusion_key;
use crate::handlers::resolve_extension;
use async_trait::async_trait;
use dw_01_store_gateway::{ProposalUpdate, Store};
use std::sync::Arc;
use tracing::{info, warn};

const CONCLUDE_METHOD: &str = "conclude-proposal";
const EXECUTE_NOTIFICATION: &str = "execute-action";

/// Marks proposals executed when conclusion and action execution land in
/// one transaction.
pub struct ActionConcluderHandler {
    store: Arc<dyn Store>,
}

impl ActionConcluderHandler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventHandler for ActionConcluderHandler {
    fn name(&self) -> &'static str {
        "action_concluder"
    }

    fn can_handle(&self, ctx: &TxContext<'_>) -> bool {
        ctx.success()
            && ctx.method() == Some(CONCLUDE_METHOD)
            && ctx.first_print(&[CONCLUDE_METHOD]).is_some()
            && ctx.first_print(&[EXECUTE_NOTIFICATION]).is_some()
    }

    async fn handle(&self, ctx: &TxContext<'_>) -> Result<(), HandlerError> {
        let Some(call) = ctx.contract_call() else {
            return Ok(());
        };
        let Some(extension) = resolve_extension(&self.store, &call.contract_identifier).await?
        else {
            return Ok(());
        };
        let Some(print) = ctx.first_print(&[CONCLUDE_METHOD]) else {
            return Ok(());
        };
        let Some((kind, key)) = conclusion_key(&print) else {
            warn!(tx_id = %ctx.tx_id(), "execute-action without proposal identity");
            return Ok(());
        };

        let Some(proposal) = self
            .store
            .get_proposal_by_key(extension.dao_id, kind, &key)
            .await?
        else {
            warn!(dao_id = %extension.dao_id, key = %key, "execution for unknown proposal");
            return Ok(());
        };

        if proposal.executed == Some(true) {
            return Ok(());
        }
        self.store
            .update_proposal(
                proposal.id,
                ProposalUpdate {
                    executed: Some(true),
                    ..ProposalUpdate::default()
                },
            )
            .await?;
        info!(proposal_id = %proposal.id, "proposal action executed");
        Ok(())
    }
}
