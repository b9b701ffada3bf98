//! # Chainhook Registration
//!
//! Builds the predicate documents the upstream chainhook service accepts
//! and registers them, pointing delivery at this deployment's webhook
//! ingress (`WEBHOOK_URL` / `WEBHOOK_AUTH`).

use crate::errors::ChainApiError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_types::Network;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// Delivery target for a registered hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSink {
    pub url: String,
    pub auth_header: String,
}

/// Errors from predicate assembly.
#[derive(Debug, Clone, Error)]
pub enum PredicateError {
    /// No event filter was configured.
    #[error("predicate has no filter")]
    MissingFilter,
    /// No webhook sink was configured.
    #[error("predicate has no webhook sink")]
    MissingSink,
}

/// The `then_that` half of a predicate: HTTP delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookAction {
    pub http_post: HookHttpPost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookHttpPost {
    pub url: String,
    pub authorization_header: String,
}

/// Per-network predicate body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkPredicate {
    pub if_this: serde_json::Value,
    pub then_that: HookAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_after_occurrence: Option<u64>,
}

/// A complete chainhook predicate document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookPredicate {
    pub name: String,
    pub chain: String,
    pub version: u32,
    pub networks: HashMap<String, NetworkPredicate>,
}

/// Fluent builder for [`HookPredicate`].
///
/// Filters are mutually exclusive; the last one set wins, matching how
/// the upstream service interprets `if_this`.
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    name: String,
    network: Network,
    if_this: Option<serde_json::Value>,
    sink: Option<WebhookSink>,
    start_block: Option<u64>,
    end_block: Option<u64>,
    expire_after_occurrence: Option<u64>,
}

impl PredicateBuilder {
    /// Start a predicate with a display name on a network.
    #[must_use]
    pub fn new(name: impl Into<String>, network: Network) -> Self {
        Self {
            name: name.into(),
            network,
            if_this: None,
            sink: None,
            start_block: None,
            end_block: None,
            expire_after_occurrence: None,
        }
    }

    /// Match contract calls of one method on one contract.
    #[must_use]
    pub fn contract_call_filter(mut self, contract_identifier: &str, method: &str) -> Self {
        self.if_this = Some(json!({
            "scope": "contract_call",
            "contract_identifier": contract_identifier,
            "method": method,
        }));
        self
    }

    /// Match print events on a contract whose payload contains `contains`.
    #[must_use]
    pub fn print_event_filter(mut self, contract_identifier: &str, contains: &str) -> Self {
        self.if_this = Some(json!({
            "scope": "print_event",
            "contract_identifier": contract_identifier,
            "contains": contains,
        }));
        self
    }

    /// Match fungible-token events for an asset.
    #[must_use]
    pub fn ft_event_filter(mut self, asset_identifier: &str, actions: &[&str]) -> Self {
        self.if_this = Some(json!({
            "scope": "ft_event",
            "asset_identifier": asset_identifier,
            "actions": actions,
        }));
        self
    }

    /// Match whole transactions by id.
    #[must_use]
    pub fn transaction_filter(mut self, txid: &str) -> Self {
        self.if_this = Some(json!({
            "scope": "txid",
            "equals": txid,
        }));
        self
    }

    /// Restrict to a block range.
    #[must_use]
    pub fn blocks(mut self, start: Option<u64>, end: Option<u64>) -> Self {
        self.start_block = start;
        self.end_block = end;
        self
    }

    /// Deliver to a webhook sink.
    #[must_use]
    pub fn webhook(mut self, sink: WebhookSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Expire the hook after N matches.
    #[must_use]
    pub fn expire_after(mut self, occurrences: u64) -> Self {
        self.expire_after_occurrence = Some(occurrences);
        self
    }

    /// Assemble the predicate document.
    pub fn build(self) -> Result<HookPredicate, PredicateError> {
        let if_this = self.if_this.ok_or(PredicateError::MissingFilter)?;
        let sink = self.sink.ok_or(PredicateError::MissingSink)?;
        let mut networks = HashMap::new();
        networks.insert(
            self.network.to_string(),
            NetworkPredicate {
                if_this,
                then_that: HookAction {
                    http_post: HookHttpPost {
                        url: sink.url,
                        authorization_header: sink.auth_header,
                    },
                },
                start_block: self.start_block,
                end_block: self.end_block,
                expire_after_occurrence: self.expire_after_occurrence,
            },
        );
        Ok(HookPredicate {
            name: self.name,
            chain: "stacks".to_string(),
            version: 1,
            networks,
        })
    }
}

/// Register a predicate with the chainhook service.
pub async fn register_chainhook(
    client: &Client,
    endpoint: &str,
    predicate: &HookPredicate,
) -> Result<serde_json::Value, ChainApiError> {
    let response = client.post(endpoint).json(predicate).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ChainApiError::Status {
            code: status.as_u16(),
        });
    }
    let body = response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| ChainApiError::Decode(e.to_string()))?;
    info!(name = %predicate.name, "chainhook registered");
    Ok(body)
}
