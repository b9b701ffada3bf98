//! # Chain-State Monitor Task
//!
//! Periodic reconciliation between the store's chain height and the
//! chain tip. When the store falls more than the stale threshold
//! behind, every missing block is fetched, synthesized into a chainhook
//! payload, and dispatched - the same path live webhook deliveries
//! take. The task itself never writes chain state; only the block-state
//! handler does, during dispatch.

use crate::config::MonitorConfig;
use crate::synthesize::{synthesize_payload, BlockFacts};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dw_01_store_gateway::Store;
use dw_02_chain_client::{ChainApi, ChainApiError};
use dw_03_job_engine::{
    ExternalResource, JobContext, JobError, JobOutcome, JobPriority, Task, TaskMetadata,
};
use dw_04_chainhook::ChainhookDispatcher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Task type key for registration and config overrides.
pub const TASK_TYPE: &str = "chain_state_monitor";

/// Result payload of one monitor run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStateMonitorResult {
    pub network: String,
    pub is_stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    pub elapsed_minutes: f64,
    pub blocks_behind: u64,
    pub blocks_processed: Vec<u64>,
}

/// Reconciles store chain state against the chain tip.
pub struct ChainStateMonitorTask {
    store: Arc<dyn Store>,
    chain: Arc<dyn ChainApi>,
    dispatcher: Arc<ChainhookDispatcher>,
    config: MonitorConfig,
}

fn store_error(err: shared_types::StoreError) -> JobError {
    match err {
        shared_types::StoreError::Unavailable(msg) => JobError::ResourceUnavailable(msg),
        other => JobError::Fatal(other.to_string()),
    }
}

impl ChainStateMonitorTask {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        chain: Arc<dyn ChainApi>,
        dispatcher: Arc<ChainhookDispatcher>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            chain,
            dispatcher,
            config,
        }
    }

    /// The task contract this monitor registers under.
    #[must_use]
    pub fn metadata() -> TaskMetadata {
        TaskMetadata::new(TASK_TYPE, "Chain State Monitor")
            .with_description("Monitors blockchain state and replays missing blocks")
            .with_interval(Duration::from_secs(90))
            .with_priority(JobPriority::Medium)
            .with_max_retries(3)
            .with_retry_delay(Duration::from_secs(120))
            .with_timeout(Duration::from_secs(300))
            .with_max_concurrent(1)
            .with_dead_letter(true)
            .with_batch_size(20)
            .with_requires([ExternalResource::Blockchain, ExternalResource::Store])
    }

    /// Fetch, synthesize, and dispatch one missing block.
    async fn process_block(&self, height: u64) -> Result<(), ChainApiError> {
        let transactions = self.chain.get_block_transactions(height).await?;
        info!(height, count = transactions.len(), "replaying block");

        // Empty blocks still advance chain state, so fall back to the
        // block endpoint for the identifiers.
        let (hash, parent_hash, burn_block_height, block_time) = match transactions.first() {
            Some(first) => (
                first.block_hash.clone(),
                first.parent_block_hash.clone(),
                Some(first.burn_block_height),
                Some(first.block_time),
            ),
            None => {
                let block = self.chain.get_block_by_height(height).await?;
                (
                    block.hash,
                    block.parent_block_hash,
                    Some(block.burn_block_height),
                    Some(block.block_time),
                )
            }
        };

        let payload = synthesize_payload(
            &BlockFacts {
                height,
                hash: &hash,
                parent_hash: &parent_hash,
                burn_block_height,
                block_time,
            },
            &transactions,
        );
        let summary = self.dispatcher.dispatch(&payload).await;
        info!(
            height,
            transactions = summary.transactions,
            handled = summary.handled,
            failures = summary.failures,
            "block replayed"
        );
        Ok(())
    }

    fn outcome(result: &ChainStateMonitorResult, success: bool, message: String) -> JobOutcome {
        let payload = serde_json::to_value(result).unwrap_or_default();
        if success {
            JobOutcome::ok_with(message, payload)
        } else {
            JobOutcome {
                success: false,
                message,
                error: None,
                payload: Some(payload),
            }
        }
    }
}

#[async_trait]
impl Task for ChainStateMonitorTask {
    async fn validate_resources(&self, _ctx: &JobContext) -> Result<(), JobError> {
        self.chain
            .get_info()
            .await
            .map(|_| ())
            .map_err(|e| JobError::ResourceUnavailable(e.to_string()))
    }

    async fn execute(&self, _ctx: &JobContext) -> Result<Vec<JobOutcome>, JobError> {
        let network = self.config.network;

        let Some(state) = self
            .store
            .get_chain_state(network)
            .await
            .map_err(store_error)?
        else {
            warn!(%network, "no chain state recorded for network");
            let result = ChainStateMonitorResult {
                network: network.to_string(),
                is_stale: true,
                last_updated: None,
                elapsed_minutes: 0.0,
                blocks_behind: 0,
                blocks_processed: vec![],
            };
            return Ok(vec![Self::outcome(
                &result,
                false,
                format!("no chain state found for network {network}"),
            )]);
        };

        let elapsed_minutes = (Utc::now() - state.updated_at).num_seconds() as f64 / 60.0;

        let tip_height = match self.chain.get_info().await {
            Ok(info) => info.chain_tip.block_height,
            Err(err) => {
                // Tip unavailable: degrade to the time-based check.
                warn!(error = %err, "tip fetch failed, using time-based staleness check");
                let is_stale = elapsed_minutes > self.config.stale_threshold_minutes as f64;
                let result = ChainStateMonitorResult {
                    network: network.to_string(),
                    is_stale,
                    last_updated: Some(state.updated_at),
                    elapsed_minutes,
                    blocks_behind: 0,
                    blocks_processed: vec![],
                };
                return Ok(vec![Self::outcome(
                    &result,
                    false,
                    format!("error checking chain height, used time-based check: {err}"),
                )]);
            }
        };

        let blocks_behind = tip_height.saturating_sub(state.block_height);
        let is_stale = blocks_behind > self.config.stale_threshold_blocks;
        info!(
            %network,
            db_height = state.block_height,
            tip_height,
            blocks_behind,
            is_stale,
            "chain state comparison"
        );

        if !is_stale {
            let result = ChainStateMonitorResult {
                network: network.to_string(),
                is_stale: false,
                last_updated: Some(state.updated_at),
                elapsed_minutes,
                blocks_behind,
                blocks_processed: vec![],
            };
            return Ok(vec![Self::outcome(
                &result,
                true,
                format!("chain state for network {network} is {blocks_behind} blocks behind"),
            )]);
        }

        warn!(
            blocks_behind,
            threshold = self.config.stale_threshold_blocks,
            "chain state stale, replaying missing blocks"
        );

        let mut blocks_processed = Vec::new();
        for height in (state.block_height + 1)..=tip_height {
            match self.process_block(height).await {
                Ok(()) => blocks_processed.push(height),
                Err(err) => {
                    // Keep going: later blocks are still recoverable, and
                    // the next pass retries the gap.
                    error!(height, error = %err, "failed to replay block");
                }
            }
        }

        let result = ChainStateMonitorResult {
            network: network.to_string(),
            is_stale: true,
            last_updated: Some(state.updated_at),
            elapsed_minutes,
            blocks_behind,
            blocks_processed: blocks_processed.clone(),
        };
        Ok(vec![Self::outcome(
            &result,
            true,
            format!(
                "chain state was {blocks_behind} blocks behind; processed {} blocks",
                blocks_processed.len()
            ),
        )])
    }

    async fn cleanup(&self, _ctx: &JobContext, _outcomes: Option<&[JobOutcome]>) {
        tracing::debug!("chain state monitor cleanup complete");
    }
}
