//! # Store Port
//!
//! The interface the rest of the system uses to reach the persistent
//! store. Adapters: `MemoryStore` (this crate); a relational adapter is
//! the host application's concern.

use crate::records::{
    NewDao, NewExtension, NewProposal, NewToken, NewTrade, NewVote, ProposalUpdate, TokenUpdate,
};
use async_trait::async_trait;
use shared_types::{
    ChainState, ContractPrincipal, Dao, DaoId, Extension, Network, Proposal, ProposalId,
    ProposalKey, ProposalKind, StoreError, Token, TokenId, TokenTrade, Vote,
};

/// Result of a vote insert.
///
/// The vote row's existence is the idempotency token for tally updates:
/// a `Duplicate` insert must not bump tallies again.
#[derive(Debug, Clone)]
pub enum VoteWrite {
    /// The row was inserted.
    Inserted(Vote),
    /// A row with the same `(proposal, voter, tx_id)` already existed.
    Duplicate(Vote),
}

impl VoteWrite {
    /// True when this write inserted a new row.
    #[must_use]
    pub fn inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }

    /// The stored vote row, whichever way the write went.
    #[must_use]
    pub fn vote(&self) -> &Vote {
        match self {
            Self::Inserted(v) | Self::Duplicate(v) => v,
        }
    }
}

/// Result of a chain-state upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStateWrite {
    /// The write was applied.
    Applied { height: u64 },
    /// The write was rejected because it would regress the stored height.
    RejectedRegression { stored: u64, offered: u64 },
}

impl ChainStateWrite {
    /// True when the write was applied.
    #[must_use]
    pub fn applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Typed accessors over the persistent store.
///
/// Every operation is transactional and atomic on its own; callers never
/// hold locks across operations.
#[async_trait]
pub trait Store: Send + Sync {
    // --- DAOs ---

    async fn create_dao(&self, new: NewDao) -> Result<Dao, StoreError>;
    async fn get_dao_by_id(&self, id: DaoId) -> Result<Option<Dao>, StoreError>;
    async fn get_dao_by_name(&self, name: &str) -> Result<Option<Dao>, StoreError>;

    // --- Extensions ---

    async fn create_extension(&self, new: NewExtension) -> Result<Extension, StoreError>;
    async fn get_extension_by_principal(
        &self,
        principal: &ContractPrincipal,
    ) -> Result<Option<Extension>, StoreError>;
    async fn list_extensions_by_dao(&self, dao_id: DaoId) -> Result<Vec<Extension>, StoreError>;

    // --- Tokens ---

    async fn create_token(&self, new: NewToken) -> Result<Token, StoreError>;
    async fn get_token_by_principal(
        &self,
        principal: &ContractPrincipal,
    ) -> Result<Option<Token>, StoreError>;
    async fn update_token(&self, id: TokenId, update: TokenUpdate) -> Result<Token, StoreError>;

    // --- Proposals ---

    async fn create_proposal(&self, new: NewProposal) -> Result<Proposal, StoreError>;
    async fn get_proposal_by_key(
        &self,
        dao_id: DaoId,
        kind: ProposalKind,
        key: &ProposalKey,
    ) -> Result<Option<Proposal>, StoreError>;
    async fn update_proposal(
        &self,
        id: ProposalId,
        update: ProposalUpdate,
    ) -> Result<Proposal, StoreError>;

    /// Atomically add `amount` to the for/against tally of a proposal.
    ///
    /// Callers gate this on [`VoteWrite::inserted`] so a replayed vote
    /// bumps tallies at most once.
    async fn increment_proposal_tallies(
        &self,
        id: ProposalId,
        value: bool,
        amount: &str,
    ) -> Result<Proposal, StoreError>;

    /// Proposals awaiting evaluation (active, no decision yet), oldest
    /// first, bounded by `limit`.
    async fn list_unevaluated_proposals(&self, limit: usize) -> Result<Vec<Proposal>, StoreError>;

    // --- Votes ---

    /// Insert a vote, deduplicating on `(proposal, voter, tx_id)`.
    async fn create_vote(&self, new: NewVote) -> Result<VoteWrite, StoreError>;
    async fn list_votes_by_proposal(&self, id: ProposalId) -> Result<Vec<Vote>, StoreError>;

    // --- Trades ---

    /// Record a bonding-curve trade; returns `false` when the
    /// `(tx_id, event_index)` pair was already recorded.
    async fn record_trade(&self, new: NewTrade) -> Result<bool, StoreError>;
    async fn list_trades_by_token(&self, token_contract: &str)
        -> Result<Vec<TokenTrade>, StoreError>;

    // --- Chain state ---

    async fn get_chain_state(&self, network: Network) -> Result<Option<ChainState>, StoreError>;

    /// Compare-and-set upsert: applies the write only when `height` is
    /// greater than or equal to the stored height.
    async fn upsert_chain_state(
        &self,
        network: Network,
        height: u64,
        hash: &str,
    ) -> Result<ChainStateWrite, StoreError>;

    // --- Liveness ---

    /// Cheap probe used by startup validation.
    async fn healthcheck(&self) -> Result<(), StoreError>;
}
