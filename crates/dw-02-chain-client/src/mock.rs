//! # Mock Chain API
//!
//! Scripted adapter for tests: a settable tip, per-height blocks and
//! transactions, and failure injection for the info endpoint and for
//! individual blocks.

use crate::errors::ChainApiError;
use crate::models::{ApiInfo, BlockTransaction, ChainBlock, ChainTip};
use crate::ports::ChainApi;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
struct MockState {
    blocks: HashMap<u64, ChainBlock>,
    transactions: HashMap<u64, Vec<BlockTransaction>>,
    failing_blocks: HashSet<u64>,
}

/// Scripted implementation of [`ChainApi`].
#[derive(Default)]
pub struct MockChainApi {
    tip_height: AtomicU64,
    fail_info: AtomicBool,
    info_calls: AtomicU64,
    state: RwLock<MockState>,
}

impl MockChainApi {
    /// Empty mock at height 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reported tip height.
    pub fn set_tip(&self, height: u64) {
        self.tip_height.store(height, Ordering::SeqCst);
    }

    /// Make `get_info` fail until cleared.
    pub fn fail_info(&self, fail: bool) {
        self.fail_info.store(fail, Ordering::SeqCst);
    }

    /// Make block fetches at `height` fail.
    pub fn fail_block(&self, height: u64) {
        self.state.write().failing_blocks.insert(height);
    }

    /// Number of `get_info` calls observed.
    #[must_use]
    pub fn info_calls(&self) -> u64 {
        self.info_calls.load(Ordering::SeqCst)
    }

    /// Script a block with its transactions. The block hash and parent
    /// hash default from the height when not preset.
    pub fn put_block(&self, height: u64, transactions: Vec<BlockTransaction>) {
        let mut state = self.state.write();
        state.blocks.insert(
            height,
            ChainBlock {
                hash: format!("0xblock{height}"),
                parent_block_hash: format!("0xblock{}", height.saturating_sub(1)),
                height,
                burn_block_height: 800_000 + height,
                block_time: 1_700_000_000 + height as i64,
                ..ChainBlock::default()
            },
        );
        state.transactions.insert(height, transactions);
    }

    /// Script a block with explicit metadata.
    pub fn put_block_with_metadata(&self, block: ChainBlock, transactions: Vec<BlockTransaction>) {
        let mut state = self.state.write();
        let height = block.height;
        state.blocks.insert(height, block);
        state.transactions.insert(height, transactions);
    }
}

#[async_trait]
impl ChainApi for MockChainApi {
    async fn get_info(&self) -> Result<ApiInfo, ChainApiError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_info.load(Ordering::SeqCst) {
            return Err(ChainApiError::Network("mock: info unavailable".to_string()));
        }
        let height = self.tip_height.load(Ordering::SeqCst);
        Ok(ApiInfo {
            server_version: "mock".to_string(),
            status: "ready".to_string(),
            chain_tip: ChainTip {
                block_height: height,
                block_hash: format!("0xblock{height}"),
                ..ChainTip::default()
            },
        })
    }

    async fn get_block_by_height(&self, height: u64) -> Result<ChainBlock, ChainApiError> {
        let state = self.state.read();
        if state.failing_blocks.contains(&height) {
            return Err(ChainApiError::Status { code: 502 });
        }
        state
            .blocks
            .get(&height)
            .cloned()
            .ok_or(ChainApiError::Status { code: 404 })
    }

    async fn get_block_transactions(
        &self,
        height: u64,
    ) -> Result<Vec<BlockTransaction>, ChainApiError> {
        let state = self.state.read();
        if state.failing_blocks.contains(&height) {
            return Err(ChainApiError::Status { code: 502 });
        }
        let mut txs = state.transactions.get(&height).cloned().unwrap_or_default();
        txs.sort_by_key(|tx| tx.tx_index);
        Ok(txs)
    }
}
