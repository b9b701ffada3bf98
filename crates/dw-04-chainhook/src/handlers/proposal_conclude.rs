//! # Proposal Conclusion Handler
//!
//! Captures successful `conclude-proposal` calls and writes the
//! authoritative conclusion data: the contract's tallies supersede the
//! incrementally maintained ones, and `liquid_tokens` is set only if
//! previously unset.

use crate::dispatch::{EventHandler, PrintEvent, TxContext};
use crate::errors::HandlerError;
use crate::handlers::resolve_extension;
use async_trait::async_trait;
use dw_01_store_gateway::{ProposalUpdate, Store};
use shared_types::{amounts, ContractPrincipal, ProposalKey, ProposalKind, ProposalStatus};
use std::sync::Arc;
use tracing::{info, warn};

const CONCLUDE_METHOD: &str = "conclude-proposal";

/// Finalizes proposals from conclusion events.
pub struct ProposalConcludeHandler {
    store: Arc<dyn Store>,
}

impl ProposalConcludeHandler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

pub(crate) fn conclusion_key(print: &PrintEvent) -> Option<(ProposalKind, ProposalKey)> {
    let payload = &print.envelope;
    if let Some(id) = payload.u64_field("proposalId") {
        return Some((ProposalKind::Action, ProposalKey::OnChainId(id)));
    }
    if let Some(principal) = payload.str_field("proposal") {
        if let Ok(principal) = ContractPrincipal::parse(principal) {
            return Some((ProposalKind::Core, ProposalKey::Principal(principal)));
        }
    }
    None
}

#[async_trait]
impl EventHandler for ProposalConcludeHandler {
    fn name(&self) -> &'static str {
        "proposal_conclude"
    }

    fn can_handle(&self, ctx: &TxContext<'_>) -> bool {
        ctx.success() && ctx.method() == Some(CONCLUDE_METHOD)
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
            warn!(tx_id = %ctx.tx_id(), "no conclusion information in transaction events");
            return Ok(());
        };
        let Some((kind, key)) = conclusion_key(&print) else {
            warn!(tx_id = %ctx.tx_id(), "could not determine proposal from conclusion payload");
            return Ok(());
        };

        let Some(proposal) = self
            .store
            .get_proposal_by_key(extension.dao_id, kind, &key)
            .await?
        else {
            warn!(dao_id = %extension.dao_id, key = %key, "conclusion for unknown proposal");
            return Ok(());
        };

        let payload = &print.envelope;
        let update = ProposalUpdate {
            concluded_by: payload.str_field("concludedBy").map(str::to_string),
            executed: payload.bool_field("executed"),
            met_quorum: payload.bool_field("metQuorum"),
            met_threshold: payload.bool_field("metThreshold"),
            passed: payload.bool_field("passed"),
            // The contract is the source of truth at conclusion.
            votes_for: Some(payload.amount_field("votesFor").unwrap_or_else(amounts::zero)),
            votes_against: Some(
                payload
                    .amount_field("votesAgainst")
                    .unwrap_or_else(amounts::zero),
            ),
            // Monotone: only ever set once.
            liquid_tokens: if proposal.liquid_tokens.is_none() {
                Some(
                    payload
                        .amount_field("liquidTokens")
                        .unwrap_or_else(amounts::zero),
                )
            } else {
                None
            },
            status: Some(ProposalStatus::Concluded),
            ..ProposalUpdate::default()
        };

        let updated = self.store.update_proposal(proposal.id, update).await?;
        info!(
            proposal_id = %updated.id,
            passed = ?updated.passed,
            executed = ?updated.executed,
            votes_for = %updated.votes_for,
            votes_against = %updated.votes_against,
            "proposal concluded"
        );
        Ok(())
    }
}
