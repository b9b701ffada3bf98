//! # Shared Types - Domain Model for DAOWatch
//!
//! Defines the entities, identifiers, and shared error types used across
//! all subsystems: DAOs, extensions, tokens, proposals, votes, chain state,
//! and trade audit records.
//!
//! Subsystems own their operational error types; only errors that cross
//! crate boundaries (store, principal, amount arithmetic) live here.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod amounts;
pub mod entities;
pub mod errors;
pub mod network;
pub mod principal;

// Re-export main types
pub use entities::{
    ChainState, ContractStatus, Dao, DaoId, Extension, ExtensionId, Proposal, ProposalId,
    ProposalKey, ProposalKind, ProposalStatus, Token, TokenId, TokenTrade, TradeSide, Vote, VoteId,
};
pub use errors::{AmountError, PrincipalError, StoreError};
pub use network::Network;
pub use principal::ContractPrincipal;
