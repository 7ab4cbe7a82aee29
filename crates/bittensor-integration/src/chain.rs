//! Chain seam used by the validator loop

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a weight extrinsic waits before returning
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitWait {
    /// Return as soon as the extrinsic is submitted
    #[default]
    None,
    /// Wait for block inclusion
    Inclusion,
    /// Wait for finalization
    Finalization,
}

impl fmt::Display for SubmitWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitWait::None => write!(f, "none"),
            SubmitWait::Inclusion => write!(f, "inclusion"),
            SubmitWait::Finalization => write!(f, "finalization"),
        }
    }
}

impl std::str::FromStr for SubmitWait {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(SubmitWait::None),
            "inclusion" | "included" => Ok(SubmitWait::Inclusion),
            "finalization" | "finalized" => Ok(SubmitWait::Finalization),
            other => Err(format!("unknown wait mode: {}", other)),
        }
    }
}

/// Result of refreshing the metagraph
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// Block the metagraph was read at
    pub block: u64,
    /// Number of neurons on the subnet
    pub neurons: u64,
}

/// A single weight-setting extrinsic
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightSubmission {
    pub netuid: u16,
    pub uids: Vec<u16>,
    /// Weights in chain form (u16, max-upscaled)
    pub weights: Vec<u16>,
    pub version_key: u64,
    pub wait: SubmitWait,
}

/// Shape of a submission result as reported by the chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Extrinsic accepted
    Submitted { tx_hash: Option<String> },
    /// Extrinsic refused or failed on chain
    Rejected { message: String },
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted { .. })
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitOutcome::Submitted { tx_hash: Some(hash) } => write!(f, "submitted ({})", hash),
            SubmitOutcome::Submitted { tx_hash: None } => write!(f, "submitted"),
            SubmitOutcome::Rejected { message } => write!(f, "rejected: {}", message),
        }
    }
}

/// Everything the validator needs from the chain
#[async_trait]
pub trait Chain: Send + Sync {
    /// Subnet this client is bound to
    fn netuid(&self) -> u16;

    /// Refresh the cached metagraph
    async fn sync(&mut self) -> Result<SyncSnapshot>;

    /// Read the subnet owner hotkey (SS58) from chain storage
    async fn subnet_owner_hotkey(&self) -> Result<String>;

    /// Resolve a hotkey to its UID in the cached metagraph
    fn uid_for_hotkey(&self, hotkey: &str) -> Option<u16>;

    /// Submit a weight-setting extrinsic
    ///
    /// Chain-side failures come back as `SubmitOutcome::Rejected`; `Err` is
    /// reserved for the client being unusable (not connected, no signer).
    async fn set_weights(&self, submission: &WeightSubmission) -> Result<SubmitOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_wait_parse() {
        assert_eq!("none".parse::<SubmitWait>().unwrap(), SubmitWait::None);
        assert_eq!(
            "Included".parse::<SubmitWait>().unwrap(),
            SubmitWait::Inclusion
        );
        assert_eq!(
            "finalization".parse::<SubmitWait>().unwrap(),
            SubmitWait::Finalization
        );
        assert!("eventually".parse::<SubmitWait>().is_err());
    }

    #[test]
    fn test_submit_wait_default_does_not_wait() {
        assert_eq!(SubmitWait::default(), SubmitWait::None);
    }

    #[test]
    fn test_submit_outcome_display() {
        let ok = SubmitOutcome::Submitted {
            tx_hash: Some("0xabc".into()),
        };
        assert!(ok.is_success());
        assert_eq!(ok.to_string(), "submitted (0xabc)");

        let rejected = SubmitOutcome::Rejected {
            message: "SettingWeightsTooFast".into(),
        };
        assert!(!rejected.is_success());
        assert_eq!(rejected.to_string(), "rejected: SettingWeightsTooFast");
    }

    #[test]
    fn test_weight_submission_serde() {
        let submission = WeightSubmission {
            netuid: 7,
            uids: vec![5],
            weights: vec![u16::MAX],
            version_key: 187,
            wait: SubmitWait::None,
        };

        let json = serde_json::to_string(&submission).unwrap();
        assert!(json.contains("\"wait\":\"none\""));
        let parsed: WeightSubmission = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, submission);
    }
}
