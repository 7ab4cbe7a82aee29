//! Burn validator
//!
//! A validator neuron whose only policy is to assign 100% of its weight to
//! the subnet owner's UID at a fixed interval, while keeping its metagraph
//! in sync every tick.
//!
//! ```ignore
//! let chain = MockChain::new(1).with_owner_uid("5F...", 0);
//! let store = StateStore::temporary()?;
//! let mut validator = Validator::new(ValidatorConfig::default(), chain, store)?;
//! validator.start().await?;
//! ```

pub mod config;
pub mod error;
pub mod forward;
pub mod schedule;
pub mod state;
pub mod validator;
pub mod weights;

pub use config::ValidatorConfig;
pub use error::{Result, ValidatorError};
pub use forward::{ForwardPass, NoopForward};
pub use schedule::{BurnMarker, BurnSchedule};
pub use state::{StateStore, ValidatorState};
pub use validator::{BurnReport, TickOutcome, Validator};
pub use weights::{normalize_scores, to_chain_weights, version_key};

/// Validator version, also the source of the default weight version key
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
