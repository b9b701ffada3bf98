//! # Test Fixtures
//!
//! Builders for chainhook payloads and seeded stores, shared by this
//! crate's tests, the monitor crate, and the workspace test suite.

use crate::models::{
    ApplyBlock, BlockIdentifier, BlockMetadata, ChainhookInfo, ChainhookPayload, ContractCallKind,
    Position, Receipt, ReceiptEvent, TransactionIdentifier, TransactionKind, TransactionMetadata,
    TransactionWithReceipt,
};
use dw_01_store_gateway::{NewDao, NewExtension, Store};
use serde_json::{json, Value};
use shared_types::{ContractPrincipal, ContractStatus, Dao, Extension};
use std::sync::Arc;

/// Fluent builder for one transaction with receipt.
pub struct TxBuilder {
    hash: String,
    index: u32,
    sender: String,
    success: bool,
    kind: TransactionKind,
    events: Vec<Value>,
}

impl TxBuilder {
    /// A successful contract call.
    #[must_use]
    pub fn contract_call(hash: &str, contract_identifier: &str, method: &str) -> Self {
        Self {
            hash: hash.to_string(),
            index: 0,
            sender: "SP000SENDER".to_string(),
            success: true,
            kind: TransactionKind::ContractCall(ContractCallKind {
                contract_identifier: contract_identifier.to_string(),
                method: method.to_string(),
                args: vec![],
            }),
            events: vec![],
        }
    }

    /// A coinbase transaction (claimed by no handler).
    #[must_use]
    pub fn coinbase(hash: &str) -> Self {
        Self {
            hash: hash.to_string(),
            index: 0,
            sender: "SP000MINER".to_string(),
            success: true,
            kind: TransactionKind::Coinbase,
            events: vec![],
        }
    }

    #[must_use]
    pub fn index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn sender(mut self, sender: &str) -> Self {
        self.sender = sender.to_string();
        self
    }

    #[must_use]
    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }

    /// Attach a `print` smart-contract event.
    #[must_use]
    pub fn print_event(mut self, contract_identifier: &str, notification: &str, payload: Value) -> Self {
        let index = self.events.len() as u32;
        self.events.push(json!({
            "type": "SmartContractEvent",
            "position": { "index": index },
            "data": {
                "contract_identifier": contract_identifier,
                "topic": "print",
                "value": { "notification": notification, "payload": payload }
            }
        }));
        self
    }

    /// Attach an FT transfer event.
    #[must_use]
    pub fn ft_transfer(mut self, asset_identifier: &str, sender: &str, recipient: &str, amount: &str) -> Self {
        let index = self.events.len() as u32;
        self.events.push(json!({
            "type": "FTTransferEvent",
            "position": { "index": index },
            "data": {
                "asset_identifier": asset_identifier,
                "sender": sender,
                "recipient": recipient,
                "amount": amount
            }
        }));
        self
    }

    /// Finish the transaction.
    #[must_use]
    pub fn build(self) -> TransactionWithReceipt {
        let events: Vec<ReceiptEvent> = self
            .events
            .into_iter()
            .map(|e| serde_json::from_value(e).expect("fixture event decodes"))
            .collect();
        TransactionWithReceipt {
            transaction_identifier: TransactionIdentifier { hash: self.hash },
            metadata: TransactionMetadata {
                description: String::new(),
                execution_cost: None,
                fee: 0,
                kind: self.kind,
                nonce: 0,
                position: Position { index: self.index },
                raw_tx: String::new(),
                receipt: Receipt {
                    contract_calls_stack: vec![],
                    events,
                    mutated_assets_radius: vec![],
                    mutated_contracts_radius: vec![],
                },
                result: "(ok true)".to_string(),
                sender: self.sender,
                sponsor: None,
                success: self.success,
            },
            operations: vec![],
        }
    }
}

/// One applied block at `height` holding `transactions`.
#[must_use]
pub fn block(height: u64, transactions: Vec<TransactionWithReceipt>) -> ApplyBlock {
    ApplyBlock {
        block_identifier: BlockIdentifier {
            hash: format!("0xblock{height}"),
            index: height,
        },
        parent_block_identifier: Some(BlockIdentifier {
            hash: format!("0xblock{}", height.saturating_sub(1)),
            index: height.saturating_sub(1),
        }),
        metadata: BlockMetadata {
            block_time: Some(1_700_000_000 + height as i64),
            ..BlockMetadata::default()
        },
        timestamp: Some(1_700_000_000 + height as i64),
        transactions,
    }
}

/// A payload applying a single block.
#[must_use]
pub fn payload(apply_block: ApplyBlock) -> ChainhookPayload {
    ChainhookPayload {
        apply: vec![apply_block],
        chainhook: ChainhookInfo::default(),
        events: vec![],
        rollback: vec![],
    }
}

/// Seed a DAO with one governance extension under `contract_identifier`.
pub async fn seed_dao(store: &Arc<dyn Store>, contract_identifier: &str) -> (Dao, Extension) {
    let dao = store
        .create_dao(NewDao {
            name: format!("dao-for-{contract_identifier}"),
            mission: "test mission".to_string(),
            description: "test dao".to_string(),
            is_deployed: true,
            is_broadcasted: true,
        })
        .await
        .expect("dao seeds");
    let extension = store
        .create_extension(NewExtension {
            dao_id: dao.id,
            type_tag: "EXTENSIONS".to_string(),
            subtype: "ACTION_PROPOSALS".to_string(),
            contract_principal: ContractPrincipal::parse(contract_identifier)
                .expect("valid principal"),
            tx_id: "0xdeploy".to_string(),
            status: ContractStatus::Deployed,
        })
        .await
        .expect("extension seeds");
    (dao, extension)
}
