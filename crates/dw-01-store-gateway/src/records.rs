//! # Create and Update Records
//!
//! Inputs to the store port. Create records carry the caller-supplied
//! fields; the adapter mints ids and timestamps. Update records are
//! all-`Option` partial updates: `None` fields are left untouched.

use shared_types::{ContractPrincipal, ContractStatus, ProposalKind, ProposalStatus, TradeSide};

/// Input for [`crate::Store::create_dao`].
#[derive(Debug, Clone)]
pub struct NewDao {
    pub name: String,
    pub mission: String,
    pub description: String,
    pub is_deployed: bool,
    pub is_broadcasted: bool,
}

/// Input for [`crate::Store::create_extension`].
#[derive(Debug, Clone)]
pub struct NewExtension {
    pub dao_id: shared_types::DaoId,
    pub type_tag: String,
    pub subtype: String,
    pub contract_principal: ContractPrincipal,
    pub tx_id: String,
    pub status: ContractStatus,
}

/// Input for [`crate::Store::create_token`].
#[derive(Debug, Clone)]
pub struct NewToken {
    pub dao_id: shared_types::DaoId,
    pub contract_principal: ContractPrincipal,
    pub tx_id: String,
    pub name: String,
    pub description: String,
    pub symbol: String,
    pub decimals: u8,
    pub max_supply: String,
    pub uri: Option<String>,
    pub image_url: Option<String>,
    pub x_url: Option<String>,
    pub telegram_url: Option<String>,
    pub website_url: Option<String>,
    pub status: ContractStatus,
}

/// Partial update for a token row.
#[derive(Debug, Clone, Default)]
pub struct TokenUpdate {
    pub uri: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<ContractStatus>,
    pub last_trade_tx_id: Option<String>,
    pub last_traded_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Input for [`crate::Store::create_proposal`].
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub dao_id: shared_types::DaoId,
    pub kind: ProposalKind,
    pub on_chain_id: Option<u64>,
    pub contract_principal: Option<ContractPrincipal>,
    pub title: String,
    pub content: String,
    pub creator: String,
    pub tx_id: String,
    pub status: ProposalStatus,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Partial update for a proposal row.
///
/// Tally fields are absolute values; incremental tally maintenance goes
/// through [`crate::Store::increment_proposal_tallies`] instead so that
/// concurrent vote replays cannot lose updates.
#[derive(Debug, Clone, Default)]
pub struct ProposalUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub creator: Option<String>,
    pub tx_id: Option<String>,
    pub status: Option<ProposalStatus>,

    pub evaluation_score: Option<f64>,
    pub evaluation_decision: Option<bool>,
    pub evaluation_flags: Option<Vec<String>>,
    pub evaluation_summary: Option<String>,

    pub votes_for: Option<String>,
    pub votes_against: Option<String>,
    pub liquid_tokens: Option<String>,

    pub passed: Option<bool>,
    pub executed: Option<bool>,
    pub met_quorum: Option<bool>,
    pub met_threshold: Option<bool>,
    pub concluded_by: Option<String>,

    pub burn_start_height: Option<u64>,
    pub burn_end_height: Option<u64>,
}

/// Input for [`crate::Store::create_vote`].
#[derive(Debug, Clone)]
pub struct NewVote {
    pub proposal_id: shared_types::ProposalId,
    pub voter: String,
    pub contract_caller: String,
    pub tx_sender: String,
    pub amount: String,
    pub value: bool,
    pub tx_id: String,
}

/// Input for [`crate::Store::record_trade`].
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub token_contract: String,
    pub side: TradeSide,
    pub trader: String,
    pub amount: String,
    pub tx_id: String,
    pub event_index: u32,
}
