//! # Shared Error Types
//!
//! Errors that cross crate boundaries. Operational errors (job engine,
//! chain client, webhook parsing) live with their subsystems.

use thiserror::Error;

/// Errors from the store gateway.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store engine is unreachable or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from contract-principal validation.
#[derive(Debug, Clone, Error)]
pub enum PrincipalError {
    /// No `.` separator between address and contract name.
    #[error("contract principal missing separator: {0}")]
    MissingSeparator(String),

    /// Address component is empty.
    #[error("contract principal has empty address: {0}")]
    EmptyAddress(String),

    /// Contract-name component is empty or contains a nested separator.
    #[error("contract principal has invalid contract name: {0}")]
    InvalidContractName(String),
}

/// Errors from fixed-point amount arithmetic.
#[derive(Debug, Clone, Error)]
pub enum AmountError {
    /// Empty amount string.
    #[error("empty amount")]
    Empty,

    /// Not a base-10 unsigned integer.
    #[error("not a valid amount: {0}")]
    NotANumber(String),

    /// Addition overflowed the 128-bit range.
    #[error("amount arithmetic overflow")]
    Overflow,
}
