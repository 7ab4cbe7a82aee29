//! Mock chain for validator tests
//!
//! Simulates metagraph sync, owner lookup and weight submission without
//! connecting to the real network. Every call is recorded in a shared
//! `MockCalls` log that stays readable after the chain is moved into a
//! validator.

use crate::{Chain, SubmitOutcome, SyncSnapshot, WeightSubmission};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Calls observed by a `MockChain`
#[derive(Clone, Debug, Default)]
pub struct MockCalls {
    pub syncs: usize,
    pub owner_queries: usize,
    pub submissions: Vec<WeightSubmission>,
}

/// In-memory `Chain` implementation
#[derive(Clone, Debug)]
pub struct MockChain {
    netuid: u16,
    owner_hotkey: Option<String>,
    hotkeys: HashMap<String, u16>,
    block: u64,
    block_step: u64,
    fail_sync: bool,
    sync_delay: Option<Duration>,
    outcome: SubmitOutcome,
    calls: Arc<Mutex<MockCalls>>,
}

impl MockChain {
    /// Create a mock chain for the given netuid
    pub fn new(netuid: u16) -> Self {
        Self {
            netuid,
            owner_hotkey: None,
            hotkeys: HashMap::new(),
            block: 0,
            block_step: 1,
            fail_sync: false,
            sync_delay: None,
            outcome: SubmitOutcome::Submitted {
                tx_hash: Some("0xmock".to_string()),
            },
            calls: Arc::new(Mutex::new(MockCalls::default())),
        }
    }

    /// Register a neuron in the mock metagraph
    pub fn with_neuron(mut self, hotkey: &str, uid: u16) -> Self {
        self.hotkeys.insert(hotkey.to_string(), uid);
        self
    }

    /// Set the subnet owner hotkey returned by storage reads
    pub fn with_owner(mut self, hotkey: &str) -> Self {
        self.owner_hotkey = Some(hotkey.to_string());
        self
    }

    /// Register the owner and its UID in one step
    pub fn with_owner_uid(self, hotkey: &str, uid: u16) -> Self {
        self.with_owner(hotkey).with_neuron(hotkey, uid)
    }

    /// Block reported before the first sync and the step added per sync
    pub fn with_blocks(mut self, start: u64, step: u64) -> Self {
        self.block = start;
        self.block_step = step;
        self
    }

    /// Outcome returned by every weight submission
    pub fn with_outcome(mut self, outcome: SubmitOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Make every sync fail
    pub fn failing_sync(mut self) -> Self {
        self.fail_sync = true;
        self
    }

    /// Make every sync take `delay` before answering
    pub fn with_sync_delay(mut self, delay: Duration) -> Self {
        self.sync_delay = Some(delay);
        self
    }

    /// Shared handle to the call log
    pub fn calls(&self) -> Arc<Mutex<MockCalls>> {
        self.calls.clone()
    }

    /// Snapshot of the call log
    pub fn snapshot(&self) -> MockCalls {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Chain for MockChain {
    fn netuid(&self) -> u16 {
        self.netuid
    }

    async fn sync(&mut self) -> Result<SyncSnapshot> {
        self.calls.lock().syncs += 1;
        if let Some(delay) = self.sync_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_sync {
            return Err(anyhow::anyhow!("mock sync failure"));
        }
        self.block += self.block_step;
        Ok(SyncSnapshot {
            block: self.block,
            neurons: self.hotkeys.len() as u64,
        })
    }

    async fn subnet_owner_hotkey(&self) -> Result<String> {
        self.calls.lock().owner_queries += 1;
        self.owner_hotkey
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No subnet owner hotkey for netuid {}", self.netuid))
    }

    fn uid_for_hotkey(&self, hotkey: &str) -> Option<u16> {
        self.hotkeys.get(hotkey).copied()
    }

    async fn set_weights(&self, submission: &WeightSubmission) -> Result<SubmitOutcome> {
        self.calls.lock().submissions.push(submission.clone());
        Ok(self.outcome.clone())
    }
}
