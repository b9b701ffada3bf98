//! # HTTP Chain API Adapter
//!
//! reqwest-backed implementation of the chain API port against a
//! Hiro-style REST API.

use crate::errors::ChainApiError;
use crate::models::{ApiInfo, BlockTransaction, BlockTransactionsPage, ChainBlock};
use crate::ports::ChainApi;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared_types::Network;
use std::time::Duration;
use tracing::debug;

/// Default mainnet API endpoint.
pub const MAINNET_API_URL: &str = "https://api.hiro.so";
/// Default testnet API endpoint.
pub const TESTNET_API_URL: &str = "https://api.testnet.hiro.so";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_LIMIT: u32 = 50;

/// HTTP implementation of [`ChainApi`].
pub struct HttpChainApi {
    client: Client,
    base_url: String,
}

impl HttpChainApi {
    /// Create a client against an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChainApiError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ChainApiError::from)?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    /// Create a client against the default endpoint for a network.
    pub fn for_network(network: Network) -> Result<Self, ChainApiError> {
        let base = match network {
            Network::Mainnet => MAINNET_API_URL,
            Network::Testnet => TESTNET_API_URL,
        };
        Self::new(base)
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChainApiError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "chain api request");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChainApiError::Status {
                code: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ChainApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChainApi for HttpChainApi {
    async fn get_info(&self) -> Result<ApiInfo, ChainApiError> {
        self.get_json("/info").await
    }

    async fn get_block_by_height(&self, height: u64) -> Result<ChainBlock, ChainApiError> {
        self.get_json(&format!("/block/by_height/{height}")).await
    }

    async fn get_block_transactions(
        &self,
        height: u64,
    ) -> Result<Vec<BlockTransaction>, ChainApiError> {
        let mut all = Vec::new();
        let mut offset = 0u32;
        loop {
            let page: BlockTransactionsPage = self
                .get_json(&format!(
                    "/block/{height}/transactions?limit={PAGE_LIMIT}&offset={offset}"
                ))
                .await?;
            let fetched = page.results.len() as u32;
            all.extend(page.results);
            offset += fetched;
            if fetched == 0 || offset >= page.total {
                break;
            }
        }
        all.sort_by_key(|tx| tx.tx_index);
        Ok(all)
    }
}
