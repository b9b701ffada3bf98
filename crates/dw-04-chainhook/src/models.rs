//! # Chainhook Wire Model
//!
//! Typed representation of chainhook webhook payloads:
//! `{ apply, chainhook, events, rollback }`, blocks with identifiers and
//! metadata, transactions with kind, receipt events, and operations.
//!
//! Transaction kinds and receipt events are tagged unions on the wire.
//! Unrecognized tags (and recognized tags whose data does not decode)
//! are preserved as `Unknown` variants rather than rejected, so handlers
//! can still inspect raw fields and new upstream event types never stall
//! ingestion.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Block hash plus height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockIdentifier {
    #[serde(default)]
    pub hash: String,
    pub index: u64,
}

/// Transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransactionIdentifier {
    pub hash: String,
}

/// Position of a transaction or event within its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    #[serde(default)]
    pub index: u32,
}

/// The predicate that matched, echoed back by the chainhook service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Predicate {
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub higher_than: u64,
}

/// Envelope describing the hook that produced a delivery.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChainhookInfo {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub is_streaming_blocks: bool,
    #[serde(default)]
    pub predicate: Predicate,
}

/// Block-level metadata the core reads; everything else is optional and
/// omitted from synthesized payloads when unknown.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitcoin_anchor_block_identifier: Option<BlockIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacks_block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pox_cycle_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pox_cycle_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pox_cycle_position: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_bitvec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_public_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_signature: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenure_height: Option<u64>,
}

/// Execution cost accounting attached to a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionCost {
    #[serde(default)]
    pub read_count: u64,
    #[serde(default)]
    pub read_length: u64,
    #[serde(default)]
    pub runtime: u64,
    #[serde(default)]
    pub write_count: u64,
    #[serde(default)]
    pub write_length: u64,
}

/// Contract call payload of a `ContractCall` transaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallKind {
    pub contract_identifier: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Contract deployment payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDeploymentKind {
    pub contract_identifier: String,
}

/// Classification of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionKind {
    ContractCall(ContractCallKind),
    ContractDeployment(ContractDeploymentKind),
    NativeTokenTransfer,
    Coinbase,
    /// Tag not recognized, or its data did not decode. Raw fields kept.
    Unknown { kind_type: String, data: Value },
}

impl TransactionKind {
    /// The contract call payload, when this is a call.
    #[must_use]
    pub fn as_contract_call(&self) -> Option<&ContractCallKind> {
        match self {
            Self::ContractCall(call) => Some(call),
            _ => None,
        }
    }

    /// The wire tag for this kind.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::ContractCall(_) => "ContractCall",
            Self::ContractDeployment(_) => "ContractDeployment",
            Self::NativeTokenTransfer => "NativeTokenTransfer",
            Self::Coinbase => "Coinbase",
            Self::Unknown { kind_type, .. } => kind_type,
        }
    }
}

impl<'de> Deserialize<'de> for TransactionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawKind {
            #[serde(rename = "type")]
            kind_type: String,
            #[serde(default)]
            data: Value,
        }

        let raw = RawKind::deserialize(deserializer)?;
        Ok(match raw.kind_type.as_str() {
            "ContractCall" => match serde_json::from_value(raw.data.clone()) {
                Ok(call) => Self::ContractCall(call),
                Err(_) => Self::Unknown {
                    kind_type: raw.kind_type,
                    data: raw.data,
                },
            },
            "ContractDeployment" => match serde_json::from_value(raw.data.clone()) {
                Ok(deployment) => Self::ContractDeployment(deployment),
                Err(_) => Self::Unknown {
                    kind_type: raw.kind_type,
                    data: raw.data,
                },
            },
            "NativeTokenTransfer" => Self::NativeTokenTransfer,
            "Coinbase" => Self::Coinbase,
            _ => Self::Unknown {
                kind_type: raw.kind_type,
                data: raw.data,
            },
        })
    }
}

impl Serialize for TransactionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            Self::ContractCall(call) => json!({ "type": "ContractCall", "data": call }),
            Self::ContractDeployment(deployment) => {
                json!({ "type": "ContractDeployment", "data": deployment })
            }
            Self::NativeTokenTransfer => json!({ "type": "NativeTokenTransfer" }),
            Self::Coinbase => json!({ "type": "Coinbase" }),
            Self::Unknown { kind_type, data } => {
                if data.is_null() {
                    json!({ "type": kind_type })
                } else {
                    json!({ "type": kind_type, "data": data })
                }
            }
        };
        value.serialize(serializer)
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Decoded payload of a `print` smart-contract event:
/// `{ notification, payload }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintEnvelope {
    pub notification: String,
    #[serde(default)]
    pub payload: Value,
}

impl PrintEnvelope {
    /// String field of the payload.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Integer field; numeric strings are accepted.
    #[must_use]
    pub fn u64_field(&self, key: &str) -> Option<u64> {
        match self.payload.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Boolean field; "true"/"false" strings are accepted.
    #[must_use]
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        match self.payload.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Amount field as a canonical fixed-point string.
    #[must_use]
    pub fn amount_field(&self, key: &str) -> Option<String> {
        match self.payload.get(key)? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// Data of a `SmartContractEvent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartContractEventData {
    pub contract_identifier: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub value: Value,
}

impl SmartContractEventData {
    /// Decode the `print` envelope when this event is a print with a
    /// structured `{ notification, payload }` value.
    #[must_use]
    pub fn print_envelope(&self) -> Option<PrintEnvelope> {
        if self.topic != "print" {
            return None;
        }
        serde_json::from_value(self.value.clone()).ok()
    }
}

/// Data of FT transfer/mint/burn events.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FtTransferData {
    #[serde(default)]
    pub asset_identifier: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
}

impl FtTransferData {
    /// The token contract principal part of the asset identifier
    /// (`SP...token::symbol` -> `SP...token`).
    #[must_use]
    pub fn token_contract(&self) -> &str {
        self.asset_identifier
            .split("::")
            .next()
            .unwrap_or(&self.asset_identifier)
    }
}

/// Classified receipt event content.
#[derive(Debug, Clone)]
pub enum EventPayload {
    SmartContract(SmartContractEventData),
    StxTransfer(Value),
    FtMint(FtTransferData),
    FtTransfer(FtTransferData),
    FtBurn(FtTransferData),
    NftMint(Value),
    NftTransfer(Value),
    Unknown { event_type: String, data: Value },
}

impl EventPayload {
    /// The wire tag for this event.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::SmartContract(_) => "SmartContractEvent",
            Self::StxTransfer(_) => "STXTransferEvent",
            Self::FtMint(_) => "FTMintEvent",
            Self::FtTransfer(_) => "FTTransferEvent",
            Self::FtBurn(_) => "FTBurnEvent",
            Self::NftMint(_) => "NFTMintEvent",
            Self::NftTransfer(_) => "NFTTransferEvent",
            Self::Unknown { event_type, .. } => event_type,
        }
    }
}

/// One event from a transaction receipt, with its position.
#[derive(Debug, Clone)]
pub struct ReceiptEvent {
    pub index: u32,
    pub payload: EventPayload,
}

impl<'de> Deserialize<'de> for ReceiptEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawEvent {
            #[serde(rename = "type")]
            event_type: String,
            #[serde(default)]
            position: Position,
            #[serde(default)]
            data: Value,
        }

        let raw = RawEvent::deserialize(deserializer)?;
        let payload = match raw.event_type.as_str() {
            "SmartContractEvent" => match serde_json::from_value(raw.data.clone()) {
                Ok(data) => EventPayload::SmartContract(data),
                Err(_) => EventPayload::Unknown {
                    event_type: raw.event_type,
                    data: raw.data,
                },
            },
            "STXTransferEvent" => EventPayload::StxTransfer(raw.data),
            "FTMintEvent" | "FTTransferEvent" | "FTBurnEvent" => {
                match serde_json::from_value::<FtTransferData>(raw.data.clone()) {
                    Ok(transfer) => match raw.event_type.as_str() {
                        "FTMintEvent" => EventPayload::FtMint(transfer),
                        "FTBurnEvent" => EventPayload::FtBurn(transfer),
                        _ => EventPayload::FtTransfer(transfer),
                    },
                    Err(_) => EventPayload::Unknown {
                        event_type: raw.event_type,
                        data: raw.data,
                    },
                }
            }
            "NFTMintEvent" => EventPayload::NftMint(raw.data),
            "NFTTransferEvent" => EventPayload::NftTransfer(raw.data),
            _ => EventPayload::Unknown {
                event_type: raw.event_type,
                data: raw.data,
            },
        };
        Ok(Self {
            index: raw.position.index,
            payload,
        })
    }
}

impl Serialize for ReceiptEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = match &self.payload {
            EventPayload::SmartContract(data) => json!(data),
            EventPayload::StxTransfer(data)
            | EventPayload::NftMint(data)
            | EventPayload::NftTransfer(data) => data.clone(),
            EventPayload::FtMint(data)
            | EventPayload::FtTransfer(data)
            | EventPayload::FtBurn(data) => json!(data),
            EventPayload::Unknown { data, .. } => data.clone(),
        };
        json!({
            "type": self.payload.type_name(),
            "position": { "index": self.index },
            "data": data,
        })
        .serialize(serializer)
    }
}

/// Transaction receipt: the events plus bookkeeping the core ignores.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Receipt {
    #[serde(default)]
    pub contract_calls_stack: Vec<Value>,
    #[serde(default)]
    pub events: Vec<ReceiptEvent>,
    #[serde(default)]
    pub mutated_assets_radius: Vec<Value>,
    #[serde(default)]
    pub mutated_contracts_radius: Vec<Value>,
}

/// Metadata of one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_cost: Option<ExecutionCost>,
    #[serde(default)]
    pub fee: u64,
    pub kind: TransactionKind,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub raw_tx: String,
    #[serde(default)]
    pub receipt: Receipt,
    #[serde(default)]
    pub result: String,
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,
    pub success: bool,
}

/// Rosetta-style balance operation attached to a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Operation {
    #[serde(default)]
    pub account: OperationAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<OperationAmount>,
    #[serde(default)]
    pub operation_identifier: OperationId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_operations: Vec<OperationId>,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub op_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperationAccount {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperationAmount {
    #[serde(default)]
    pub currency: OperationCurrency,
    #[serde(default)]
    pub value: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperationCurrency {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct OperationId {
    #[serde(default)]
    pub index: u32,
}

/// One transaction with its receipt and operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWithReceipt {
    pub transaction_identifier: TransactionIdentifier,
    pub metadata: TransactionMetadata,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// One applied (or rolled back) block with its transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyBlock {
    pub block_identifier: BlockIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_block_identifier: Option<BlockIdentifier>,
    #[serde(default)]
    pub metadata: BlockMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub transactions: Vec<TransactionWithReceipt>,
}

impl ApplyBlock {
    /// Best-known block time: metadata first, then the block timestamp.
    #[must_use]
    pub fn block_time(&self) -> Option<i64> {
        self.metadata.block_time.or(self.timestamp)
    }
}

/// Top-level webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainhookPayload {
    pub apply: Vec<ApplyBlock>,
    #[serde(default)]
    pub chainhook: ChainhookInfo,
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(default)]
    pub rollback: Vec<ApplyBlock>,
}
