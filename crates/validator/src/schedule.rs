//! Burn interval schedule
//!
//! Decides when the burn policy runs again, either by wall-clock seconds or
//! by chain blocks since the last push.

use serde::{Deserialize, Serialize};

/// Default interval between burns (20 minutes)
pub const DEFAULT_BURN_INTERVAL_SECS: u64 = 20 * 60;

/// Bittensor target block time
pub const BLOCK_TIME_SECS: u64 = 12;

/// When the last burn was pushed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnMarker {
    /// Unix timestamp (seconds) of the last burn
    pub last_burn_at: Option<i64>,
    /// Chain block of the last burn
    pub last_burn_block: Option<u64>,
}

impl BurnMarker {
    pub fn record(&mut self, now: i64, block: u64) {
        self.last_burn_at = Some(now);
        self.last_burn_block = Some(block);
    }
}

/// How the burn interval is measured
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BurnSchedule {
    WallClock { interval_secs: u64 },
    Blocks { interval: u64 },
}

impl Default for BurnSchedule {
    fn default() -> Self {
        BurnSchedule::WallClock {
            interval_secs: DEFAULT_BURN_INTERVAL_SECS,
        }
    }
}

impl BurnSchedule {
    /// A burn is due when none has happened yet or the interval has elapsed.
    pub fn is_due(&self, marker: &BurnMarker, now: i64, block: u64) -> bool {
        match *self {
            BurnSchedule::WallClock { interval_secs } => match marker.last_burn_at {
                None => true,
                Some(last) => {
                    now.saturating_sub(last) >= i64::try_from(interval_secs).unwrap_or(i64::MAX)
                }
            },
            BurnSchedule::Blocks { interval } => match marker.last_burn_block {
                None => true,
                Some(last) => block.saturating_sub(last) >= interval,
            },
        }
    }

    /// Approximate interval length in seconds, for logging
    pub fn approx_secs(&self) -> u64 {
        match *self {
            BurnSchedule::WallClock { interval_secs } => interval_secs,
            BurnSchedule::Blocks { interval } => interval.saturating_mul(BLOCK_TIME_SECS),
        }
    }
}

impl std::fmt::Display for BurnSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BurnSchedule::WallClock { interval_secs } => write!(f, "every {}s", interval_secs),
            BurnSchedule::Blocks { interval } => write!(f, "every {} blocks", interval),
        }
    }
}
