//! # Chain API Port
//!
//! The read interface the monitor and startup validation consume.
//! Production: [`crate::HttpChainApi`]. Testing: [`crate::MockChainApi`].

use crate::errors::ChainApiError;
use crate::models::{ApiInfo, BlockTransaction, ChainBlock};
use async_trait::async_trait;

/// Read access to the chain API.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Current server info including the chain tip.
    async fn get_info(&self) -> Result<ApiInfo, ChainApiError>;

    /// Block metadata by height.
    async fn get_block_by_height(&self, height: u64) -> Result<ChainBlock, ChainApiError>;

    /// All transactions in a block, in `tx_index` order. Pagination is
    /// driven to exhaustion internally.
    async fn get_block_transactions(
        &self,
        height: u64,
    ) -> Result<Vec<BlockTransaction>, ChainApiError>;
}
