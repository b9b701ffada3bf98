//! # Proposal Create Handler
//!
//! Captures `propose-action` / `create-proposal` print events on
//! governance extensions and upserts the proposal row.

use crate::dispatch::{EventHandler, TxContext};
use crate::errors::HandlerError;
use crate::handlers::resolve_extension;
use async_trait::async_trait;
use chrono::DateTime;
use dw_01_store_gateway::{NewProposal, ProposalUpdate, Store};
use shared_types::{ContractPrincipal, ProposalKey, ProposalKind, ProposalStatus};
use std::sync::Arc;
use tracing::{info, warn};

const NOTIFICATIONS: &[&str] = &["propose-action", "create-proposal"];

/// Creates (or completes) proposal rows from governance print events.
pub struct ProposalCreateHandler {
    store: Arc<dyn Store>,
}

impl ProposalCreateHandler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventHandler for ProposalCreateHandler {
    fn name(&self) -> &'static str {
        "proposal_create"
    }

    fn can_handle(&self, ctx: &TxContext<'_>) -> bool {
        ctx.success() && ctx.contract_call().is_some() && ctx.first_print(NOTIFICATIONS).is_some()
    }

    async fn handle(&self, ctx: &TxContext<'_>) -> Result<(), HandlerError> {
        let Some(call) = ctx.contract_call() else {
            return Ok(());
        };
        let Some(extension) = resolve_extension(&self.store, &call.contract_identifier).await?
        else {
            return Ok(());
        };

        // Conflicting ids across events in the same transaction: first
        // matching print event wins.
        let Some(print) = ctx.first_print(NOTIFICATIONS) else {
            return Ok(());
        };
        let payload = &print.envelope;

        let (kind, key) = if let Some(id) = payload.u64_field("proposalId") {
            (ProposalKind::Action, ProposalKey::OnChainId(id))
        } else if let Some(principal) = payload.str_field("proposal") {
            match ContractPrincipal::parse(principal) {
                Ok(principal) => (ProposalKind::Core, ProposalKey::Principal(principal)),
                Err(err) => {
                    warn!(tx_id = %ctx.tx_id(), error = %err, "invalid proposal principal");
                    return Ok(());
                }
            }
        } else {
            warn!(tx_id = %ctx.tx_id(), "proposal event missing proposalId and proposal");
            return Ok(());
        };

        let creator = payload
            .str_field("creator")
            .or_else(|| payload.str_field("caller"))
            .unwrap_or(ctx.sender())
            .to_string();
        let content = payload
            .str_field("parameters")
            .or_else(|| payload.str_field("memo"))
            .unwrap_or_default()
            .to_string();
        let title = payload.str_field("title").unwrap_or_default().to_string();

        match self
            .store
            .get_proposal_by_key(extension.dao_id, kind, &key)
            .await?
        {
            None => {
                let created_at = ctx
                    .block_time()
                    .and_then(|t| DateTime::from_timestamp(t, 0));
                let proposal = self
                    .store
                    .create_proposal(NewProposal {
                        dao_id: extension.dao_id,
                        kind,
                        on_chain_id: match &key {
                            ProposalKey::OnChainId(id) => Some(*id),
                            ProposalKey::Principal(_) => None,
                        },
                        contract_principal: match key {
                            ProposalKey::Principal(principal) => Some(principal),
                            ProposalKey::OnChainId(_) => None,
                        },
                        title,
                        content,
                        creator,
                        tx_id: ctx.tx_id().to_string(),
                        status: ProposalStatus::Active,
                        created_at,
                    })
                    .await?;
                info!(
                    proposal_id = %proposal.id,
                    dao_id = %proposal.dao_id,
                    key = %key_display(&proposal),
                    "proposal created"
                );
            }
            Some(existing) => {
                // Fill only fields a partial earlier ingest left unset.
                let mut update = ProposalUpdate::default();
                if existing.content.is_empty() && !content.is_empty() {
                    update.content = Some(content);
                }
                if existing.creator.is_empty() {
                    update.creator = Some(creator);
                }
                if existing.tx_id.is_empty() {
                    update.tx_id = Some(ctx.tx_id().to_string());
                }
                if existing.title.is_empty() && !title.is_empty() {
                    update.title = Some(title);
                }
                if update.content.is_some()
                    || update.creator.is_some()
                    || update.tx_id.is_some()
                    || update.title.is_some()
                {
                    self.store.update_proposal(existing.id, update).await?;
                    info!(proposal_id = %existing.id, "proposal backfilled");
                }
            }
        }
        Ok(())
    }
}

fn key_display(proposal: &shared_types::Proposal) -> String {
    proposal
        .key()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "?".to_string())
}
