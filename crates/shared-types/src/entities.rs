//! # Core Entities
//!
//! Persistent domain records: DAOs, their extension contracts and token,
//! proposals and votes, the per-network chain-state singleton, and the
//! trade audit log.
//!
//! Ownership: the store gateway exclusively owns persistent entity
//! lifetimes. Everything here is plain data.

use crate::network::Network;
use crate::principal::ContractPrincipal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Mint a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Dao`].
    DaoId
);
entity_id!(
    /// Identifier of an [`Extension`].
    ExtensionId
);
entity_id!(
    /// Identifier of a [`Token`].
    TokenId
);
entity_id!(
    /// Identifier of a [`Proposal`].
    ProposalId
);
entity_id!(
    /// Identifier of a [`Vote`].
    VoteId
);

/// Deployment status of an on-chain contract record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractStatus {
    Draft,
    Pending,
    Deployed,
    Failed,
}

/// A decentralized autonomous organization.
///
/// Created by the DAO-creation webhook; never deleted. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dao {
    pub id: DaoId,
    pub name: String,
    pub mission: String,
    pub description: String,
    pub is_deployed: bool,
    pub is_broadcasted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A smart contract belonging to a DAO (governance, treasury, action
/// proposals, ...). Lookup by `contract_principal` is the primary join
/// key for webhook dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extension {
    pub id: ExtensionId,
    pub dao_id: DaoId,
    /// Coarse contract category (e.g. `EXTENSIONS`, `ACTIONS`, `BASE`).
    pub type_tag: String,
    /// Finer-grained role within the category.
    pub subtype: String,
    pub contract_principal: ContractPrincipal,
    /// Transaction that deployed the contract.
    pub tx_id: String,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

/// The fungible token of a DAO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub dao_id: DaoId,
    pub contract_principal: ContractPrincipal,
    pub tx_id: String,
    pub name: String,
    pub description: String,
    pub symbol: String,
    /// Display decimals, 0-18.
    pub decimals: u8,
    /// Fixed-point string; precision must survive round-trips.
    pub max_supply: String,
    pub uri: Option<String>,
    pub image_url: Option<String>,
    pub x_url: Option<String>,
    pub telegram_url: Option<String>,
    pub website_url: Option<String>,
    pub status: ContractStatus,
    /// Transaction id of the most recent bonding-curve trade.
    pub last_trade_tx_id: Option<String>,
    pub last_traded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Core proposals are themselves contracts; action proposals are
/// integer-id records inside a governance extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalKind {
    Core,
    Action,
}

/// Lifecycle status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Active,
    Concluded,
}

/// The on-chain identity of a proposal within its DAO and kind: action
/// proposals carry an integer id, core proposals the full contract
/// principal. Exactly one of the two identifies a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalKey {
    /// Action proposal: numeric on-chain id.
    OnChainId(u64),
    /// Core proposal: the proposal contract itself.
    Principal(ContractPrincipal),
}

impl fmt::Display for ProposalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnChainId(id) => write!(f, "#{id}"),
            Self::Principal(p) => write!(f, "{p}"),
        }
    }
}

/// A governance proposal.
///
/// Tallies and conclusion fields are monotone: once a conclusion event
/// sets them they are never reverted by later events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub dao_id: DaoId,
    pub kind: ProposalKind,
    /// Set for action proposals.
    pub on_chain_id: Option<u64>,
    /// Set for core proposals.
    pub contract_principal: Option<ContractPrincipal>,
    pub title: String,
    pub content: String,
    /// Standard principal that created the proposal.
    pub creator: String,
    pub tx_id: String,
    pub status: ProposalStatus,

    // Evaluation (written by the evaluator task).
    pub evaluation_score: Option<f64>,
    pub evaluation_decision: Option<bool>,
    pub evaluation_flags: Vec<String>,
    pub evaluation_summary: Option<String>,

    // Tallies (fixed-point strings).
    pub votes_for: String,
    pub votes_against: String,
    pub liquid_tokens: Option<String>,

    // Conclusion fields.
    pub passed: Option<bool>,
    pub executed: Option<bool>,
    pub met_quorum: Option<bool>,
    pub met_threshold: Option<bool>,
    pub concluded_by: Option<String>,

    // Burn-height vote window.
    pub burn_start_height: Option<u64>,
    pub burn_end_height: Option<u64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    /// The on-chain identity key for this proposal.
    #[must_use]
    pub fn key(&self) -> Option<ProposalKey> {
        match self.kind {
            ProposalKind::Action => self.on_chain_id.map(ProposalKey::OnChainId),
            ProposalKind::Core => self.contract_principal.clone().map(ProposalKey::Principal),
        }
    }
}

/// A single vote on a proposal.
///
/// Unique across `(proposal_id, voter, tx_id)`; replays deduplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub proposal_id: ProposalId,
    /// Standard principal of the voter.
    pub voter: String,
    pub contract_caller: String,
    pub tx_sender: String,
    /// Fixed-point token amount backing the vote.
    pub amount: String,
    /// `true` = for, `false` = against.
    pub value: bool,
    pub tx_id: String,
    pub created_at: DateTime<Utc>,
}

/// Per-network chain-state singleton.
///
/// `block_height` is monotonically non-decreasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainState {
    pub network: Network,
    pub block_height: u64,
    pub block_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// Direction of a bonding-curve trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Audit record for a bonding-curve trade, idempotent on
/// `(tx_id, event_index)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTrade {
    pub token_contract: String,
    pub side: TradeSide,
    /// Standard principal on the receiving (buy) or sending (sell) end.
    pub trader: String,
    pub amount: String,
    pub tx_id: String,
    pub event_index: u32,
    pub recorded_at: DateTime<Utc>,
}
