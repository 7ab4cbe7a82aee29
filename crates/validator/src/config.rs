//! Validator configuration

use crate::{version_key, BurnSchedule, Result, ValidatorError, VERSION};
use burn_bittensor::SubmitWait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default pause between loop iterations
pub const DEFAULT_TICK_MS: u64 = 1_000;

/// Validator loop configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// When the burn policy runs
    #[serde(default)]
    pub schedule: BurnSchedule,

    /// Pause between loop iterations in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Version key for weight submissions (derived from VERSION when unset)
    #[serde(default)]
    pub version_key: Option<u64>,

    /// How long burn submissions wait on chain
    #[serde(default)]
    pub wait: SubmitWait,
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            schedule: BurnSchedule::default(),
            tick_ms: DEFAULT_TICK_MS,
            version_key: None,
            wait: SubmitWait::None,
        }
    }
}

impl ValidatorConfig {
    /// Pause between loop iterations
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Version key sent with weights
    pub fn resolved_version_key(&self) -> Result<u64> {
        match self.version_key {
            Some(key) => Ok(key),
            None => version_key(VERSION),
        }
    }

    /// Reject configurations the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(ValidatorError::Config("tick_ms must be positive".into()));
        }
        let interval = match self.schedule {
            BurnSchedule::WallClock { interval_secs } => interval_secs,
            BurnSchedule::Blocks { interval } => interval,
        };
        if interval == 0 {
            return Err(ValidatorError::Config(
                "burn interval must be positive".into(),
            ));
        }
        self.resolved_version_key()?;
        Ok(())
    }
}
