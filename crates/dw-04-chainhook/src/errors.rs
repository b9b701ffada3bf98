//! # Ingestion Errors

use shared_types::StoreError;
use thiserror::Error;

/// A webhook payload could not be parsed into the transaction model.
///
/// The offending payload is acknowledged upstream (to prevent redelivery
/// storms) but logged in full with a correlation id.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// A required field is missing or of the wrong shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// A handler failed while processing a transaction.
///
/// Caught and logged by the dispatcher; never aborts the block.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}
