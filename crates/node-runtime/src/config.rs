//! # Runtime Configuration
//!
//! Environment-driven settings for a deployment. Everything is parsed
//! from a plain key/value view so tests never touch process environment.
//!
//! ```text
//! NETWORK                          mainnet | testnet
//! CHAIN_API_URL                    override the per-network default
//! WEBHOOK_URL / WEBHOOK_AUTH       delivery sink for hook registration
//! CHAIN_STATE_STALE_BLOCKS         catch-up threshold (default 10)
//! CHAIN_STATE_STALE_MINUTES        time fallback threshold (default 5)
//! SHUTDOWN_GRACE_SECONDS           drain budget on shutdown (default 30)
//! DW_JOB_<TYPE>_ENABLED            per-task enablement override
//! DW_JOB_<TYPE>_INTERVAL_SECONDS   per-task interval override
//! ```

use dw_03_job_engine::{JobSchedulerConfig, TaskOverride};
use shared_types::Network;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

const JOB_PREFIX: &str = "DW_JOB_";
const ENABLED_SUFFIX: &str = "_ENABLED";
const INTERVAL_SUFFIX: &str = "_INTERVAL_SECONDS";

/// Configuration errors abort startup.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("invalid NETWORK: {0}")]
    InvalidNetwork(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Fully parsed runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub network: Network,
    /// Chain API endpoint; `None` selects the network default.
    pub chain_api_url: Option<String>,
    /// Outbound hook registration sink.
    pub webhook_url: Option<String>,
    pub webhook_auth: Option<String>,
    pub stale_threshold_blocks: u64,
    pub stale_threshold_minutes: i64,
    pub jobs: JobSchedulerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            chain_api_url: None,
            webhook_url: None,
            webhook_auth: None,
            stale_threshold_blocks: 10,
            stale_threshold_minutes: 5,
            jobs: JobSchedulerConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Parse from an explicit key/value view.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(network) = vars.get("NETWORK") {
            config.network = network
                .parse()
                .map_err(|_| ConfigError::InvalidNetwork(network.clone()))?;
        }
        config.chain_api_url = vars.get("CHAIN_API_URL").cloned();
        config.webhook_url = vars.get("WEBHOOK_URL").cloned();
        config.webhook_auth = vars.get("WEBHOOK_AUTH").cloned();

        if let Some(raw) = vars.get("CHAIN_STATE_STALE_BLOCKS") {
            config.stale_threshold_blocks = parse_number(raw, "CHAIN_STATE_STALE_BLOCKS")?;
        }
        if let Some(raw) = vars.get("CHAIN_STATE_STALE_MINUTES") {
            config.stale_threshold_minutes =
                parse_number::<i64>(raw, "CHAIN_STATE_STALE_MINUTES")?;
        }
        if let Some(raw) = vars.get("SHUTDOWN_GRACE_SECONDS") {
            config.jobs.shutdown_grace =
                Duration::from_secs(parse_number(raw, "SHUTDOWN_GRACE_SECONDS")?);
        }

        for (key, value) in vars {
            let Some(rest) = key.strip_prefix(JOB_PREFIX) else {
                continue;
            };
            if let Some(task) = rest.strip_suffix(ENABLED_SUFFIX) {
                let enabled = parse_bool(value, key)?;
                entry(&mut config.jobs, task).enabled = Some(enabled);
            } else if let Some(task) = rest.strip_suffix(INTERVAL_SUFFIX) {
                let seconds: u64 = parse_number(value, key)?;
                entry(&mut config.jobs, task).interval = Some(Duration::from_secs(seconds));
            }
        }

        Ok(config)
    }
}

fn entry<'a>(jobs: &'a mut JobSchedulerConfig, task_key: &str) -> &'a mut TaskOverride {
    jobs.overrides
        .entry(task_key.to_ascii_lowercase())
        .or_default()
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn parse_bool(raw: &str, key: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
