//! # Event Handlers
//!
//! The specialized idempotent mutators behind the dispatcher: proposal
//! lifecycle (create, vote, conclude, burn-height window), bonding-curve
//! trades, chain-state tracking, and the cross-event action concluder.

use crate::errors::HandlerError;
use dw_01_store_gateway::Store;
use shared_types::{ContractPrincipal, Extension};
use std::sync::Arc;
use tracing::warn;

pub mod action_concluder;
pub mod block_state;
pub mod burn_height;
pub mod proposal_conclude;
pub mod proposal_create;
pub mod proposal_vote;
pub mod trades;

pub use action_concluder::ActionConcluderHandler;
pub use block_state::BlockStateHandler;
pub use burn_height::ProposalBurnHeightHandler;
pub use proposal_conclude::ProposalConcludeHandler;
pub use proposal_create::ProposalCreateHandler;
pub use proposal_vote::ProposalVoteHandler;
pub use trades::{BuyEventHandler, SellEventHandler, TradesConfig};

/// Resolve the extension (and thereby the DAO) a contract belongs to.
///
/// `None` means the contract is not one of ours; callers warn and skip.
pub(crate) async fn resolve_extension(
    store: &Arc<dyn Store>,
    contract_identifier: &str,
) -> Result<Option<Extension>, HandlerError> {
    let principal = match ContractPrincipal::parse(contract_identifier) {
        Ok(principal) => principal,
        Err(err) => {
            warn!(contract = %contract_identifier, error = %err, "unparseable contract identifier");
            return Ok(None);
        }
    };
    let extension = store.get_extension_by_principal(&principal).await?;
    if extension.is_none() {
        warn!(contract = %contract_identifier, "no extension found for contract");
    }
    Ok(extension)
}
