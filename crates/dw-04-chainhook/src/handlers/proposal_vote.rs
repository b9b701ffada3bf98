//! # Proposal Vote Handler
//!
//! Captures `vote-on-proposal` calls on core and action governance
//! extensions. Inserts the vote row (unique on proposal/voter/tx) and
//! bumps proposal tallies exactly once per inserted row.

use crate::dispatch::{EventHandler, TxContext};
use crate::errors::HandlerError;
use crate::handlers::resolve_extension;
use async_trait::async_trait;
use dw_01_store_gateway::{NewVote, Store};
use shared_types::{amounts, ContractPrincipal, ProposalKey, ProposalKind};
use std::sync::Arc;
use tracing::{info, warn};

const VOTE_METHOD: &str = "vote-on-proposal";

/// Records votes and maintains incremental tallies.
pub struct ProposalVoteHandler {
    store: Arc<dyn Store>,
}

impl ProposalVoteHandler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventHandler for ProposalVoteHandler {
    fn name(&self) -> &'static str {
        "proposal_vote"
    }

    fn can_handle(&self, ctx: &TxContext<'_>) -> bool {
        ctx.success() && ctx.method() == Some(VOTE_METHOD)
    }

    async fn handle(&self, ctx: &TxContext<'_>) -> Result<(), HandlerError> {
        let Some(call) = ctx.contract_call() else {
            return Ok(());
        };

        // Kind routing by governance contract name.
        let contract_name = call
            .contract_identifier
            .split_once('.')
            .map(|(_, name)| name)
            .unwrap_or("");
        let kind = if contract_name.contains("core-proposal") {
            ProposalKind::Core
        } else if contract_name.contains("action-proposal") {
            ProposalKind::Action
        } else {
            warn!(contract = %call.contract_identifier, "unknown proposal contract type");
            return Ok(());
        };

        let Some(extension) = resolve_extension(&self.store, &call.contract_identifier).await?
        else {
            return Ok(());
        };

        let Some(print) = ctx.first_print(&[VOTE_METHOD]) else {
            warn!(tx_id = %ctx.tx_id(), "no vote information in transaction events");
            return Ok(());
        };
        let payload = &print.envelope;

        let key = match kind {
            ProposalKind::Action => {
                let Some(id) = payload
                    .u64_field("proposalId")
                    .or_else(|| payload.u64_field("proposal_id"))
                else {
                    warn!(tx_id = %ctx.tx_id(), "vote event missing proposal id");
                    return Ok(());
                };
                ProposalKey::OnChainId(id)
            }
            ProposalKind::Core => {
                let Some(principal) = payload.str_field("proposal") else {
                    warn!(tx_id = %ctx.tx_id(), "vote event missing proposal principal");
                    return Ok(());
                };
                match ContractPrincipal::parse(principal) {
                    Ok(principal) => ProposalKey::Principal(principal),
                    Err(err) => {
                        warn!(tx_id = %ctx.tx_id(), error = %err, "invalid proposal principal");
                        return Ok(());
                    }
                }
            }
        };

        let Some(voter) = payload.str_field("voter") else {
            warn!(tx_id = %ctx.tx_id(), "vote event missing voter");
            return Ok(());
        };
        let Some(value) = payload.bool_field("vote") else {
            warn!(tx_id = %ctx.tx_id(), voter, "vote event missing vote value");
            return Ok(());
        };
        let amount = payload
            .amount_field("amount")
            .or_else(|| payload.amount_field("liquidTokens"))
            .unwrap_or_else(amounts::zero);
        let contract_caller = payload
            .str_field("contractCaller")
            .unwrap_or(&call.contract_identifier)
            .to_string();
        let tx_sender = payload
            .str_field("txSender")
            .unwrap_or(ctx.sender())
            .to_string();

        // A vote can legitimately precede the proposal while catching up;
        // the monitor's replay re-ingests it later.
        let Some(proposal) = self
            .store
            .get_proposal_by_key(extension.dao_id, kind, &key)
            .await?
        else {
            warn!(dao_id = %extension.dao_id, key = %key, "vote for unknown proposal, skipping");
            return Ok(());
        };

        let write = self
            .store
            .create_vote(NewVote {
                proposal_id: proposal.id,
                voter: voter.to_string(),
                contract_caller,
                tx_sender,
                amount: amount.clone(),
                value,
                tx_id: ctx.tx_id().to_string(),
            })
            .await?;

        // The vote row is the idempotency token for the tally.
        if write.inserted() {
            let updated = self
                .store
                .increment_proposal_tallies(proposal.id, value, &amount)
                .await?;
            info!(
                proposal_id = %proposal.id,
                voter,
                value,
                amount = %amount,
                votes_for = %updated.votes_for,
                votes_against = %updated.votes_against,
                "vote recorded"
            );
        }
        Ok(())
    }
}
