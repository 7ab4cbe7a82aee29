//! Bittensor configuration

use serde::{Deserialize, Serialize};

/// Default NETUID when none is configured
pub const DEFAULT_NETUID: u16 = 1;

/// Finney mainnet entrypoint
pub const FINNEY_ENDPOINT: &str = "wss://entrypoint-finney.opentensor.ai:443";

/// Bittensor network configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BittensorConfig {
    /// Subtensor WebSocket endpoint
    pub endpoint: String,

    /// Subnet UID (netuid)
    pub netuid: u16,
}

impl Default for BittensorConfig {
    fn default() -> Self {
        Self {
            endpoint: FINNEY_ENDPOINT.to_string(),
            netuid: DEFAULT_NETUID,
        }
    }
}

impl BittensorConfig {
    /// Create config for testnet
    pub fn testnet(netuid: u16) -> Self {
        Self {
            endpoint: "wss://test.finney.opentensor.ai:443".to_string(),
            netuid,
        }
    }

    /// Create config for local network
    pub fn local(netuid: u16) -> Self {
        Self {
            endpoint: "ws://127.0.0.1:9944".to_string(),
            netuid,
        }
    }

    /// Create config for mainnet
    pub fn mainnet(netuid: u16) -> Self {
        Self {
            netuid,
            ..Self::default()
        }
    }
}
