//! # DAO-Creation Webhook
//!
//! Accepts the deployment callback describing a freshly deployed DAO:
//! its contracts and token info. Creates the DAO row, the token (the
//! `TOKEN/DAO` contract), and one extension per remaining contract.

use crate::errors::{HandlerError, ParseError};
use crate::webhooks::{WebhookHandler, WebhookParser, WebhookResponse, WebhookService};
use async_trait::async_trait;
use dw_01_store_gateway::{NewDao, NewExtension, NewToken, Store};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{ContractPrincipal, ContractStatus, DaoId, ExtensionId, TokenId};
use std::sync::Arc;
use tracing::info;

const TOKEN_TYPE: &str = "TOKEN";
const DAO_SUBTYPE: &str = "DAO";

/// One deployed contract in the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractEntry {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub subtype: String,
    pub contract_principal: ContractPrincipal,
    pub tx_id: String,
}

/// Token details in the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
    pub max_supply: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub x_url: Option<String>,
    #[serde(default)]
    pub telegram_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
}

/// The full DAO-creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaoWebhookPayload {
    pub name: String,
    pub mission: String,
    #[serde(default)]
    pub description: Option<String>,
    pub contracts: Vec<ContractEntry>,
    pub token_info: TokenInfo,
}

/// Identifiers of everything the webhook created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaoWebhookResponse {
    pub dao_id: DaoId,
    pub token_id: TokenId,
    pub extension_ids: Vec<ExtensionId>,
}

/// Validating parser for the DAO-creation payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaoWebhookParser;

impl WebhookParser for DaoWebhookParser {
    type Output = DaoWebhookPayload;

    fn parse(&self, raw: &Value) -> Result<Self::Output, ParseError> {
        let payload: DaoWebhookPayload = serde_json::from_value(raw.clone())
            .map_err(|e| ParseError::MalformedPayload(e.to_string()))?;
        if payload.name.trim().is_empty() {
            return Err(ParseError::MalformedPayload("name".to_string()));
        }
        if payload.contracts.is_empty() {
            return Err(ParseError::MalformedPayload("contracts".to_string()));
        }
        if payload.token_info.decimals > 18 {
            return Err(ParseError::MalformedPayload("token_info.decimals".to_string()));
        }
        Ok(payload)
    }
}

struct DaoWebhookHandler {
    store: Arc<dyn Store>,
}

#[async_trait]
impl WebhookHandler for DaoWebhookHandler {
    type Input = DaoWebhookPayload;

    async fn handle(&self, payload: DaoWebhookPayload) -> Result<Value, HandlerError> {
        let description = payload
            .description
            .clone()
            .unwrap_or_else(|| payload.mission.clone());

        let dao = self
            .store
            .create_dao(NewDao {
                name: payload.name.clone(),
                mission: payload.mission.clone(),
                description: description.clone(),
                is_deployed: true,
                is_broadcasted: true,
            })
            .await?;
        info!(dao_id = %dao.id, name = %dao.name, "dao created");

        let token_contract = payload
            .contracts
            .iter()
            .find(|c| c.type_tag == TOKEN_TYPE && c.subtype == DAO_SUBTYPE)
            .ok_or_else(|| HandlerError::Other("no DAO token contract in payload".to_string()))?;

        let token = self
            .store
            .create_token(NewToken {
                dao_id: dao.id,
                contract_principal: token_contract.contract_principal.clone(),
                tx_id: token_contract.tx_id.clone(),
                name: payload.name.clone(),
                description,
                symbol: payload.token_info.symbol.clone(),
                decimals: payload.token_info.decimals,
                max_supply: payload.token_info.max_supply.clone(),
                uri: payload.token_info.uri.clone(),
                image_url: payload.token_info.image_url.clone(),
                x_url: payload.token_info.x_url.clone(),
                telegram_url: payload.token_info.telegram_url.clone(),
                website_url: payload.token_info.website_url.clone(),
                status: ContractStatus::Deployed,
            })
            .await?;
        info!(token_id = %token.id, symbol = %token.symbol, "dao token created");

        let mut extension_ids = Vec::new();
        for contract in &payload.contracts {
            if contract.contract_principal == token_contract.contract_principal {
                continue;
            }
            let extension = self
                .store
                .create_extension(NewExtension {
                    dao_id: dao.id,
                    type_tag: contract.type_tag.clone(),
                    subtype: contract.subtype.clone(),
                    contract_principal: contract.contract_principal.clone(),
                    tx_id: contract.tx_id.clone(),
                    status: ContractStatus::Deployed,
                })
                .await?;
            info!(
                extension_id = %extension.id,
                type_tag = %extension.type_tag,
                subtype = %extension.subtype,
                "dao extension created"
            );
            extension_ids.push(extension.id);
        }

        let response = DaoWebhookResponse {
            dao_id: dao.id,
            token_id: token.id,
            extension_ids,
        };
        serde_json::to_value(response).map_err(|e| HandlerError::Other(e.to_string()))
    }
}

/// The DAO-creation webhook service.
pub struct DaoWebhookService {
    inner: WebhookService<DaoWebhookParser, DaoWebhookHandler>,
}

impl DaoWebhookService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            inner: WebhookService::new(DaoWebhookParser, DaoWebhookHandler { store }),
        }
    }

    /// Process one DAO-creation delivery.
    pub async fn process(&self, raw: &Value) -> Result<WebhookResponse, ParseError> {
        self.inner.process(raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dw_01_store_gateway::MemoryStore;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "name": "facesdao",
            "mission": "a face for everything",
            "description": "test dao",
            "contracts": [
                {
                    "type": "TOKEN",
                    "subtype": "DAO",
                    "contract_principal": "SP123.faces-token",
                    "tx_id": "0xt1"
                },
                {
                    "type": "EXTENSIONS",
                    "subtype": "ACTION_PROPOSALS",
                    "contract_principal": "SP123.action-proposals",
                    "tx_id": "0xt2"
                },
                {
                    "type": "EXTENSIONS",
                    "subtype": "TREASURY",
                    "contract_principal": "SP123.treasury",
                    "tx_id": "0xt3"
                }
            ],
            "token_info": {
                "symbol": "FACE",
                "decimals": 6,
                "max_supply": "1000000000",
                "uri": "https://example.com/meta.json"
            }
        })
    }

    #[tokio::test]
    async fn test_dao_webhook_creates_entities() {
        let store = Arc::new(MemoryStore::new());
        let service = DaoWebhookService::new(store.clone() as Arc<dyn Store>);

        let response = service.process(&sample_payload()).await.unwrap();
        assert!(response.success);
        let data: DaoWebhookResponse = serde_json::from_value(response.data.unwrap()).unwrap();
        assert_eq!(data.extension_ids.len(), 2);

        let store: Arc<dyn Store> = store;
        let dao = store.get_dao_by_name("facesdao").await.unwrap().unwrap();
        assert!(dao.is_deployed);
        let extensions = store.list_extensions_by_dao(dao.id).await.unwrap();
        assert_eq!(extensions.len(), 2);
        let token = store
            .get_token_by_principal(&ContractPrincipal::parse("SP123.faces-token").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.symbol, "FACE");
        assert_eq!(token.decimals, 6);
    }

    #[tokio::test]
    async fn test_dao_webhook_requires_token_contract() {
        let store = Arc::new(MemoryStore::new());
        let service = DaoWebhookService::new(store as Arc<dyn Store>);
        let mut payload = sample_payload();
        payload["contracts"] = json!([{
            "type": "EXTENSIONS",
            "subtype": "TREASURY",
            "contract_principal": "SP123.treasury",
            "tx_id": "0xt3"
        }]);

        let response = service.process(&payload).await.unwrap();
        assert!(!response.success);
        assert!(response.message.contains("token contract"));
    }

    #[tokio::test]
    async fn test_dao_webhook_rejects_missing_name() {
        let store = Arc::new(MemoryStore::new());
        let service = DaoWebhookService::new(store as Arc<dyn Store>);
        let mut payload = sample_payload();
        payload["name"] = json!("   ");
        assert!(service.process(&payload).await.is_err());
    }
}
