//! # Buy / Sell Event Handlers
//!
//! React to FT transfer events on configured bonding-curve contracts.
//! Each trade lands in the audit log once, keyed by
//! `(tx_id, event_index)`, and refreshes the token's last-trade fields.

use crate::dispatch::{EventHandler, TxContext};
use crate::errors::HandlerError;
use crate::models::EventPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dw_01_store_gateway::{NewTrade, Store, TokenUpdate};
use serde::{Deserialize, Serialize};
use shared_types::{ContractPrincipal, TradeSide};
use std::sync::Arc;
use tracing::{debug, info};

/// Which contracts and methods count as bonding-curve trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradesConfig {
    /// Substrings matched against the called contract's name; empty
    /// matches any contract.
    pub contract_name_contains: Vec<String>,
    pub buy_methods: Vec<String>,
    pub sell_methods: Vec<String>,
}

impl Default for TradesConfig {
    fn default() -> Self {
        Self {
            contract_name_contains: vec!["dex".to_string()],
            buy_methods: vec!["buy".to_string(), "buy-and-deposit".to_string()],
            sell_methods: vec!["sell".to_string()],
        }
    }
}

impl TradesConfig {
    fn contract_matches(&self, contract_identifier: &str) -> bool {
        if self.contract_name_contains.is_empty() {
            return true;
        }
        let name = contract_identifier
            .split_once('.')
            .map(|(_, n)| n)
            .unwrap_or(contract_identifier);
        self.contract_name_contains
            .iter()
            .any(|needle| name.contains(needle.as_str()))
    }
}

fn claims(ctx: &TxContext<'_>, config: &TradesConfig, side: TradeSide) -> bool {
    if !ctx.success() {
        return false;
    }
    let Some(call) = ctx.contract_call() else {
        return false;
    };
    if !config.contract_matches(&call.contract_identifier) {
        return false;
    }
    let methods = match side {
        TradeSide::Buy => &config.buy_methods,
        TradeSide::Sell => &config.sell_methods,
    };
    if !methods.iter().any(|m| m == &call.method) {
        return false;
    }
    ctx.events()
        .iter()
        .any(|e| matches!(e.payload, EventPayload::FtTransfer(_)))
}

async fn record_trades(
    store: &Arc<dyn Store>,
    ctx: &TxContext<'_>,
    side: TradeSide,
) -> Result<(), HandlerError> {
    for event in ctx.events() {
        let EventPayload::FtTransfer(transfer) = &event.payload else {
            continue;
        };
        let trader = match side {
            TradeSide::Buy => transfer.recipient.clone(),
            TradeSide::Sell => transfer.sender.clone(),
        };
        let token_contract = transfer.token_contract().to_string();
        let recorded = store
            .record_trade(NewTrade {
                token_contract: token_contract.clone(),
                side,
                trader,
                amount: transfer.amount.clone(),
                tx_id: ctx.tx_id().to_string(),
                event_index: event.index,
            })
            .await?;
        if !recorded {
            debug!(tx_id = %ctx.tx_id(), event_index = event.index, "trade already recorded");
            continue;
        }

        if let Ok(principal) = ContractPrincipal::parse(&token_contract) {
            if let Some(token) = store.get_token_by_principal(&principal).await? {
                let traded_at = ctx
                    .block_time()
                    .and_then(|t| DateTime::from_timestamp(t, 0))
                    .unwrap_or_else(Utc::now);
                store
                    .update_token(
                        token.id,
                        TokenUpdate {
                            last_trade_tx_id: Some(ctx.tx_id().to_string()),
                            last_traded_at: Some(traded_at),
                            ..TokenUpdate::default()
                        },
                    )
                    .await?;
            }
        }
        info!(
            tx_id = %ctx.tx_id(),
            event_index = event.index,
            side = ?side,
            token = %token_contract,
            amount = %transfer.amount,
            "trade recorded"
        );
    }
    Ok(())
}

/// Records buys on configured bonding-curve contracts.
pub struct BuyEventHandler {
    store: Arc<dyn Store>,
    config: TradesConfig,
}

impl BuyEventHandler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: TradesConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl EventHandler for BuyEventHandler {
    fn name(&self) -> &'static str {
        "buy_event"
    }

    fn can_handle(&self, ctx: &TxContext<'_>) -> bool {
        claims(ctx, &self.config, TradeSide::Buy)
    }

    async fn handle(&self, ctx: &TxContext<'_>) -> Result<(), HandlerError> {
        record_trades(&self.store, ctx, TradeSide::Buy).await
    }
}

/// Records sells on configured bonding-curve contracts.
pub struct SellEventHandler {
    store: Arc<dyn Store>,
    config: TradesConfig,
}

impl SellEventHandler {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: TradesConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl EventHandler for SellEventHandler {
    fn name(&self) -> &'static str {
        "sell_event"
    }

    fn can_handle(&self, ctx: &TxContext<'_>) -> bool {
        claims(ctx, &self.config, TradeSide::Sell)
    }

    async fn handle(&self, ctx: &TxContext<'_>) -> Result<(), HandlerError> {
        record_trades(&self.store, ctx, TradeSide::Sell).await
    }
}
