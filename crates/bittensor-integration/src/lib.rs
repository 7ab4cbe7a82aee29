//! Bittensor chain access for the burn validator
//!
//! Provides:
//! - `Chain` - the seam the validator talks to (sync, owner lookup, weights)
//! - `SubtensorClient` - `Chain` backed by bittensor-rs
//! - `MockChain` - in-memory `Chain` for tests and dry runs

pub mod chain;
pub mod client;
pub mod config;
pub mod mock;

pub use chain::{Chain, SubmitOutcome, SubmitWait, SyncSnapshot, WeightSubmission};
pub use client::SubtensorClient;
pub use config::{BittensorConfig, DEFAULT_NETUID};
pub use mock::{MockCalls, MockChain};

/// Subtensor pallet that holds subnet storage
pub const SUBTENSOR_MODULE: &str = "SubtensorModule";

/// Storage entry mapping netuid -> subnet owner hotkey
pub const SUBNET_OWNER_HOTKEY: &str = "SubnetOwnerHotkey";
