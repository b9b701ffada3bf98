//! # Chain API Response Models
//!
//! Shapes for the three endpoints the core reads: `/info`,
//! `/block/by_height/{h}`, and `/block/{h}/transactions`. Optional
//! fields default so that API additions never break decoding.

use serde::{Deserialize, Serialize};

/// Current chain tip as reported by `/info`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChainTip {
    pub block_height: u64,
    #[serde(default)]
    pub block_hash: String,
    #[serde(default)]
    pub index_block_hash: String,
    #[serde(default)]
    pub burn_block_height: u64,
}

/// Server information from `/info`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiInfo {
    #[serde(default)]
    pub server_version: String,
    #[serde(default)]
    pub status: String,
    pub chain_tip: ChainTip,
}

/// Block metadata from `/block/by_height/{h}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChainBlock {
    pub hash: String,
    pub parent_block_hash: String,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub burn_block_height: u64,
    #[serde(default)]
    pub block_time: i64,
    #[serde(default)]
    pub tenure_height: Option<u64>,
    #[serde(default)]
    pub pox_cycle_index: Option<u64>,
    #[serde(default)]
    pub pox_cycle_length: Option<u64>,
    #[serde(default)]
    pub pox_cycle_position: Option<u64>,
    #[serde(default)]
    pub signer_bitvec: Option<String>,
    #[serde(default)]
    pub signer_public_keys: Option<Vec<String>>,
    #[serde(default)]
    pub signer_signature: Option<Vec<String>>,
}

/// Clarity value representation attached to results and logs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClarityValue {
    #[serde(default)]
    pub hex: String,
    #[serde(default)]
    pub repr: String,
}

/// Contract log carried by a smart-contract event.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractLog {
    #[serde(default)]
    pub contract_id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub value: ClarityValue,
}

/// Asset movement carried by FT/STX events.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssetEventData {
    #[serde(default)]
    pub asset_event_type: String,
    #[serde(default)]
    pub asset_identifier: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub amount: String,
}

/// Deployed contract details on `smart_contract` transactions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SmartContractData {
    #[serde(default)]
    pub contract_id: String,
}

/// One event on a transaction, as the transactions endpoint reports it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransactionEventRecord {
    #[serde(default)]
    pub event_index: u32,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub tx_id: String,
    #[serde(default)]
    pub contract_log: Option<ContractLog>,
    #[serde(default)]
    pub asset: Option<AssetEventData>,
}

/// STX transfer details on `token_transfer` transactions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenTransferData {
    #[serde(default)]
    pub recipient_address: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Contract call details on `contract_call` transactions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractCallData {
    #[serde(default)]
    pub contract_id: String,
    #[serde(default)]
    pub function_name: String,
    #[serde(default)]
    pub function_args: Vec<serde_json::Value>,
}

/// A transaction from `/block/{h}/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockTransaction {
    pub tx_id: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub fee_rate: String,
    #[serde(default)]
    pub sender_address: String,
    #[serde(default)]
    pub sponsored: bool,
    #[serde(default)]
    pub sponsor_address: Option<String>,
    #[serde(default)]
    pub block_hash: String,
    #[serde(default)]
    pub parent_block_hash: String,
    #[serde(default)]
    pub block_height: u64,
    #[serde(default)]
    pub block_time: i64,
    #[serde(default)]
    pub burn_block_height: u64,
    #[serde(default)]
    pub tx_index: u32,
    #[serde(default)]
    pub tx_status: String,
    #[serde(default)]
    pub tx_type: String,
    #[serde(default)]
    pub tx_result: ClarityValue,
    #[serde(default)]
    pub raw_tx: String,
    #[serde(default)]
    pub execution_cost_read_count: u64,
    #[serde(default)]
    pub execution_cost_read_length: u64,
    #[serde(default)]
    pub execution_cost_runtime: u64,
    #[serde(default)]
    pub execution_cost_write_count: u64,
    #[serde(default)]
    pub execution_cost_write_length: u64,
    #[serde(default)]
    pub events: Vec<TransactionEventRecord>,
    #[serde(default)]
    pub token_transfer: Option<TokenTransferData>,
    #[serde(default)]
    pub contract_call: Option<ContractCallData>,
    #[serde(default)]
    pub smart_contract: Option<SmartContractData>,
}

impl BlockTransaction {
    /// Whether the chain accepted the transaction.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.tx_status == "success"
    }
}

/// One page of the transactions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockTransactionsPage {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub results: Vec<BlockTransaction>,
}
