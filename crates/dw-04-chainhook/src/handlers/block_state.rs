//! # Block State Handler
//!
//! Tracks the per-network chain-state singleton. Receives every applied
//! block; height regressions are skipped and logged, never written.

use crate::dispatch::{EventHandler, TxContext};
use crate::errors::HandlerError;
use crate::models::ApplyBlock;
use async_trait::async_trait;
use dw_01_store_gateway::{ChainStateWrite, Store};
use shared_types::Network;
use std::sync::Arc;
use tracing::{debug, warn};

/// Advances `ChainState` to each applied block.
pub struct BlockStateHandler {
    store: Arc<dyn Store>,
    network: Network,
}

impl BlockStateHandler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, network: Network) -> Self {
        Self { store, network }
    }
}

#[async_trait]
impl EventHandler for BlockStateHandler {
    fn name(&self) -> &'static str {
        "block_state"
    }

    fn can_handle(&self, _ctx: &TxContext<'_>) -> bool {
        false
    }

    async fn handle(&self, _ctx: &TxContext<'_>) -> Result<(), HandlerError> {
        Ok(())
    }

    fn handles_block(&self) -> bool {
        true
    }

    async fn handle_block(&self, block: &ApplyBlock) -> Result<(), HandlerError> {
        let height = block.block_identifier.index;
        let hash = &block.block_identifier.hash;
        match self
            .store
            .upsert_chain_state(self.network, height, hash)
            .await?
        {
            ChainStateWrite::Applied { .. } => {
                debug!(network = %self.network, height, "chain state advanced");
            }
            ChainStateWrite::RejectedRegression { stored, offered } => {
                warn!(
                    network = %self.network,
                    stored,
                    offered,
                    "chain state regression skipped"
                );
            }
        }
        Ok(())
    }
}
