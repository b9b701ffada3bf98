//! # Monitor Configuration

use serde::{Deserialize, Serialize};
use shared_types::Network;

/// Staleness thresholds for the chain-state monitor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub network: Network,
    /// Blocks behind the tip before catch-up kicks in. Being at most
    /// this far behind still counts as fresh (hysteresis against
    /// re-processing on every webhook hiccup).
    pub stale_threshold_blocks: u64,
    /// Fallback: minutes without a chain-state write before the state
    /// counts as stale, used when the tip cannot be fetched.
    pub stale_threshold_minutes: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            stale_threshold_blocks: 10,
            stale_threshold_minutes: 5,
        }
    }
}

impl MonitorConfig {
    /// Config for a specific network with default thresholds.
    #[must_use]
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }
}
