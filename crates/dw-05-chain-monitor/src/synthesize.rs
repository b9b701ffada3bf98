//! # Payload Synthesis
//!
//! Builds chainhook-compatible payloads from raw block transactions, so
//! replayed blocks take exactly the same dispatch path as live webhook
//! deliveries: one `apply` block, transactions in `tx_index` order,
//! receipt events classified, STX transfers expanded into DEBIT/CREDIT
//! operation pairs, and the predicate envelope filled in.

use dw_02_chain_client::models::{BlockTransaction, TransactionEventRecord};
use dw_04_chainhook::models::{
    ApplyBlock, BlockIdentifier, BlockMetadata, ChainhookInfo, ChainhookPayload, ContractCallKind,
    ContractDeploymentKind, EventPayload, ExecutionCost, FtTransferData, Operation,
    OperationAccount, OperationAmount, OperationCurrency, OperationId, Position, Predicate,
    Receipt, ReceiptEvent, SmartContractEventData, TransactionIdentifier, TransactionKind,
    TransactionMetadata, TransactionWithReceipt,
};
use serde_json::{json, Value};
use uuid::Uuid;

/// Inputs describing one block to synthesize.
#[derive(Debug, Clone)]
pub struct BlockFacts<'a> {
    pub height: u64,
    pub hash: &'a str,
    pub parent_hash: &'a str,
    pub burn_block_height: Option<u64>,
    pub block_time: Option<i64>,
}

/// Build a full chainhook payload for one block.
#[must_use]
pub fn synthesize_payload(
    facts: &BlockFacts<'_>,
    transactions: &[BlockTransaction],
) -> ChainhookPayload {
    let mut txs: Vec<&BlockTransaction> = transactions.iter().collect();
    txs.sort_by_key(|tx| tx.tx_index);

    let apply = ApplyBlock {
        block_identifier: BlockIdentifier {
            hash: facts.hash.to_string(),
            index: facts.height,
        },
        parent_block_identifier: Some(BlockIdentifier {
            hash: facts.parent_hash.to_string(),
            index: facts.height.saturating_sub(1),
        }),
        metadata: BlockMetadata {
            block_time: facts.block_time,
            bitcoin_anchor_block_identifier: facts.burn_block_height.map(|index| BlockIdentifier {
                hash: String::new(),
                index,
            }),
            stacks_block_hash: Some(facts.hash.to_string()),
            ..BlockMetadata::default()
        },
        timestamp: facts.block_time,
        transactions: txs.into_iter().map(synthesize_transaction).collect(),
    };

    ChainhookPayload {
        apply: vec![apply],
        chainhook: ChainhookInfo {
            uuid: Uuid::new_v4().to_string(),
            is_streaming_blocks: false,
            predicate: Predicate {
                scope: "block_height".to_string(),
                higher_than: facts.height.saturating_sub(1),
            },
        },
        events: vec![],
        rollback: vec![],
    }
}

fn synthesize_transaction(tx: &BlockTransaction) -> TransactionWithReceipt {
    TransactionWithReceipt {
        transaction_identifier: TransactionIdentifier {
            hash: tx.tx_id.clone(),
        },
        metadata: TransactionMetadata {
            description: describe(tx),
            execution_cost: Some(ExecutionCost {
                read_count: tx.execution_cost_read_count,
                read_length: tx.execution_cost_read_length,
                runtime: tx.execution_cost_runtime,
                write_count: tx.execution_cost_write_count,
                write_length: tx.execution_cost_write_length,
            }),
            fee: tx.fee_rate.parse().unwrap_or(0),
            kind: synthesize_kind(tx),
            nonce: tx.nonce,
            position: Position { index: tx.tx_index },
            raw_tx: tx.raw_tx.clone(),
            receipt: Receipt {
                contract_calls_stack: vec![],
                events: tx.events.iter().map(synthesize_event).collect(),
                mutated_assets_radius: vec![],
                mutated_contracts_radius: vec![],
            },
            result: tx.tx_result.repr.clone(),
            sender: tx.sender_address.clone(),
            sponsor: if tx.sponsored {
                tx.sponsor_address.clone()
            } else {
                None
            },
            success: tx.succeeded(),
        },
        operations: synthesize_operations(tx),
    }
}

fn synthesize_kind(tx: &BlockTransaction) -> TransactionKind {
    match tx.tx_type.as_str() {
        "contract_call" => match &tx.contract_call {
            Some(call) => TransactionKind::ContractCall(ContractCallKind {
                contract_identifier: call.contract_id.clone(),
                method: call.function_name.clone(),
                args: call
                    .function_args
                    .iter()
                    .map(|arg| match arg {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            }),
            None => TransactionKind::Unknown {
                kind_type: "ContractCall".to_string(),
                data: Value::Null,
            },
        },
        "token_transfer" => TransactionKind::NativeTokenTransfer,
        "coinbase" => TransactionKind::Coinbase,
        "smart_contract" => match &tx.smart_contract {
            Some(deployment) => TransactionKind::ContractDeployment(ContractDeploymentKind {
                contract_identifier: deployment.contract_id.clone(),
            }),
            None => TransactionKind::Unknown {
                kind_type: "ContractDeployment".to_string(),
                data: Value::Null,
            },
        },
        other => TransactionKind::Unknown {
            kind_type: other.to_string(),
            data: Value::Null,
        },
    }
}

fn synthesize_event(event: &TransactionEventRecord) -> ReceiptEvent {
    let payload = match event.event_type.as_str() {
        "smart_contract_log" => match &event.contract_log {
            Some(log) => EventPayload::SmartContract(SmartContractEventData {
                contract_identifier: log.contract_id.clone(),
                topic: log.topic.clone(),
                // The API reports the decoded value as a Clarity repr
                // string; a JSON-shaped repr decodes to the structured
                // envelope, anything else stays a string.
                value: serde_json::from_str(&log.value.repr)
                    .unwrap_or(Value::String(log.value.repr.clone())),
            }),
            None => EventPayload::Unknown {
                event_type: event.event_type.clone(),
                data: Value::Null,
            },
        },
        "fungible_token_asset" => match &event.asset {
            Some(asset) => {
                let data = FtTransferData {
                    asset_identifier: asset.asset_identifier.clone(),
                    sender: asset.sender.clone(),
                    recipient: asset.recipient.clone(),
                    amount: asset.amount.clone(),
                };
                match asset.asset_event_type.as_str() {
                    "mint" => EventPayload::FtMint(data),
                    "burn" => EventPayload::FtBurn(data),
                    _ => EventPayload::FtTransfer(data),
                }
            }
            None => EventPayload::Unknown {
                event_type: event.event_type.clone(),
                data: Value::Null,
            },
        },
        "stx_asset" => EventPayload::StxTransfer(
            event
                .asset
                .as_ref()
                .map(|a| json!(a))
                .unwrap_or(Value::Null),
        ),
        other => EventPayload::Unknown {
            event_type: other.to_string(),
            data: event
                .contract_log
                .as_ref()
                .map(|l| json!(l))
                .unwrap_or(Value::Null),
        },
    };
    ReceiptEvent {
        index: event.event_index,
        payload,
    }
}

fn describe(tx: &BlockTransaction) -> String {
    match tx.tx_type.as_str() {
        "token_transfer" => match &tx.token_transfer {
            Some(transfer) => format!(
                "transferred {} uSTX from {} to {}",
                transfer.amount, tx.sender_address, transfer.recipient_address
            ),
            None => format!("transaction {}", tx.tx_id),
        },
        "coinbase" => "coinbase transaction".to_string(),
        "contract_call" => match &tx.contract_call {
            Some(call) => format!("contract call: {}::{}", call.contract_id, call.function_name),
            None => format!("transaction {}", tx.tx_id),
        },
        _ => format!("transaction {}", tx.tx_id),
    }
}

fn synthesize_operations(tx: &BlockTransaction) -> Vec<Operation> {
    let Some(transfer) = &tx.token_transfer else {
        return vec![];
    };
    if tx.tx_type != "token_transfer" {
        return vec![];
    }
    let value: u128 = transfer.amount.parse().unwrap_or(0);
    let currency = OperationCurrency {
        symbol: "STX".to_string(),
        decimals: 6,
    };
    vec![
        Operation {
            account: OperationAccount {
                address: tx.sender_address.clone(),
            },
            amount: Some(OperationAmount {
                currency: currency.clone(),
                value,
            }),
            operation_identifier: OperationId { index: 0 },
            related_operations: vec![OperationId { index: 1 }],
            status: "SUCCESS".to_string(),
            op_type: "DEBIT".to_string(),
        },
        Operation {
            account: OperationAccount {
                address: transfer.recipient_address.clone(),
            },
            amount: Some(OperationAmount { currency, value }),
            operation_identifier: OperationId { index: 1 },
            related_operations: vec![OperationId { index: 0 }],
            status: "SUCCESS".to_string(),
            op_type: "CREDIT".to_string(),
        },
    ]
}
