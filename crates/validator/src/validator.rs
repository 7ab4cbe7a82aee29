//! Validator neuron
//!
//! Each tick syncs the metagraph and, when the burn schedule says so, pushes
//! a weight vector that gives the subnet owner's UID 100% of the weight.

use crate::weights::{normalize_scores, to_chain_weights};
use crate::{
    ForwardPass, NoopForward, Result, StateStore, ValidatorConfig, ValidatorError, ValidatorState,
};
use burn_bittensor::{Chain, SubmitOutcome, SyncSnapshot, WeightSubmission};
use std::future::Future;
use tracing::{debug, error, info, warn};

/// Result of one burn push
#[derive(Clone, Debug, PartialEq)]
pub struct BurnReport {
    /// UID that received the weight
    pub uid: u16,
    /// Normalized float weights (always `[1.0]`)
    pub weights: Vec<f32>,
    /// What was sent to the chain
    pub submission: WeightSubmission,
    /// What the chain answered
    pub outcome: SubmitOutcome,
}

/// Result of one loop iteration
#[derive(Clone, Debug, PartialEq)]
pub struct TickOutcome {
    pub snapshot: SyncSnapshot,
    /// Present when the burn policy ran this tick
    pub burn: Option<BurnReport>,
}

/// The burn validator
pub struct Validator<C: Chain> {
    config: ValidatorConfig,
    version_key: u64,
    chain: C,
    store: Option<StateStore>,
    state: ValidatorState,
    forward: Box<dyn ForwardPass>,
    last_snapshot: Option<SyncSnapshot>,
}

impl<C: Chain> Validator<C> {
    /// Build the validator and restore persisted state
    pub fn new(config: ValidatorConfig, chain: C, store: StateStore) -> Result<Self> {
        config.validate()?;
        let version_key = config.resolved_version_key()?;

        let mut validator = Self {
            config,
            version_key,
            chain,
            store: Some(store),
            state: ValidatorState::default(),
            forward: Box::new(NoopForward),
            last_snapshot: None,
        };

        info!("load_state()");
        validator.load_state()?;
        Ok(validator)
    }

    /// Replace the forward pass
    pub fn with_forward(mut self, forward: Box<dyn ForwardPass>) -> Self {
        self.forward = forward;
        self
    }

    pub fn version_key(&self) -> u64 {
        self.version_key
    }

    pub fn state(&self) -> &ValidatorState {
        &self.state
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Whether the state store has been closed
    pub fn is_closed(&self) -> bool {
        self.store.is_none()
    }

    fn store(&self) -> Result<&StateStore> {
        self.store
            .as_ref()
            .ok_or_else(|| ValidatorError::Storage("State store closed".into()))
    }

    /// Restore state from the store, keeping defaults when nothing is saved
    pub fn load_state(&mut self) -> Result<()> {
        match self.store()?.load_state()? {
            Some(state) => {
                info!(
                    "Loaded persisted state: step={}, last_block={}, last_burn_at={:?}, last_burn_block={:?}",
                    state.step,
                    state.last_block,
                    state.marker.last_burn_at,
                    state.marker.last_burn_block
                );
                self.state = state;
            }
            None => info!("No persisted state found, starting fresh"),
        }
        Ok(())
    }

    /// Persist the current state
    pub fn save_state(&self) -> Result<()> {
        self.store()?.save_state(&self.state)
    }

    /// Refresh the metagraph
    pub async fn sync(&mut self) -> Result<SyncSnapshot> {
        let snapshot = self
            .chain
            .sync()
            .await
            .map_err(|e| ValidatorError::Sync(format!("{:#}", e)))?;

        self.state.last_block = snapshot.block;
        self.last_snapshot = Some(snapshot);
        Ok(snapshot)
    }

    /// Run the forward pass against the latest snapshot
    pub async fn forward(&mut self) -> Result<()> {
        let snapshot = self.last_snapshot.unwrap_or_default();
        self.forward
            .forward(&snapshot)
            .await
            .map_err(|e| ValidatorError::Forward(format!("{:#}", e)))
    }

    /// UID of the subnet owner (the burn account)
    pub async fn get_burn_uid(&self) -> Result<u16> {
        let hotkey = self
            .chain
            .subnet_owner_hotkey()
            .await
            .map_err(|e| ValidatorError::Chain(format!("{:#}", e)))?;
        info!("Subnet Owner Hotkey: {}", hotkey);

        let uid = self
            .chain
            .uid_for_hotkey(&hotkey)
            .ok_or_else(|| ValidatorError::BurnUidNotFound {
                hotkey,
                netuid: self.chain.netuid(),
            })?;
        info!("Subnet Owner UID (burn): {}", uid);
        Ok(uid)
    }

    /// Assign 100% of the weight to the burn UID and push it on chain.
    ///
    /// A rejected submission is logged and reported, never retried.
    pub async fn set_burn_weights(&mut self) -> Result<BurnReport> {
        let uid = self.get_burn_uid().await?;

        let weights = normalize_scores(&[1.0]);
        info!("Burn-only weight: {:?}", weights);

        let (uids, chain_weights) = to_chain_weights(&[uid], &weights);
        let submission = WeightSubmission {
            netuid: self.chain.netuid(),
            uids,
            weights: chain_weights,
            version_key: self.version_key,
            wait: self.config.wait,
        };

        let outcome = self
            .chain
            .set_weights(&submission)
            .await
            .map_err(|e| ValidatorError::Chain(format!("{:#}", e)))?;

        match &outcome {
            SubmitOutcome::Submitted { tx_hash } => {
                info!("Successfully set burn weights (tx: {:?})", tx_hash)
            }
            SubmitOutcome::Rejected { message } => {
                error!("Failed to set burn weights: {}", message)
            }
        }

        self.state.burn_uid = Some(uid);
        Ok(BurnReport {
            uid,
            weights,
            submission,
            outcome,
        })
    }

    /// One loop iteration: sync, burn when due, persist
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        self.tick_at(chrono::Utc::now().timestamp()).await
    }

    /// `tick` with an explicit wall-clock time (unix seconds)
    pub async fn tick_at(&mut self, now: i64) -> Result<TickOutcome> {
        let snapshot = self.sync().await?;

        let burn = if self
            .config
            .schedule
            .is_due(&self.state.marker, now, snapshot.block)
        {
            let report = self.set_burn_weights().await?;
            self.state.marker.record(now, snapshot.block);
            Some(report)
        } else {
            None
        };

        self.state.step += 1;
        self.save_state()?;

        debug!(
            "Tick {} done: block={}, burned={}",
            self.state.step,
            snapshot.block,
            burn.is_some()
        );
        Ok(TickOutcome { snapshot, burn })
    }

    /// Run the loop until `shutdown` resolves.
    ///
    /// `shutdown` is polled from the start, alongside the running tick. A
    /// tick in flight when it fires still completes, then the store is
    /// closed and no further tick runs. Runtime faults are logged and the
    /// loop continues. Any other error closes the store and is returned.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future,
    {
        info!(
            "Starting validator loop: netuid={}, burn {} (~{}s), tick={:?}, version_key={}",
            self.chain.netuid(),
            self.config.schedule,
            self.config.schedule.approx_secs(),
            self.config.tick(),
            self.version_key
        );

        tokio::pin!(shutdown);
        let mut interrupted = false;

        loop {
            let result = {
                let tick = self.tick();
                tokio::pin!(tick);
                loop {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown, if !interrupted => {
                            interrupted = true;
                            info!("Interrupt received, finishing current tick");
                        }
                        result = &mut tick => break result,
                    }
                }
            };

            if let Err(e) = result {
                if e.is_runtime() {
                    error!("{}", e);
                } else {
                    error!("Fatal validator error: {}", e);
                    if let Err(close_err) = self.close() {
                        warn!("Failed to close state store: {}", close_err);
                    }
                    return Err(e);
                }
            }

            if interrupted {
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.tick()) => {}
            }
        }

        self.close()?;
        info!("Interrupt detected. Exiting validator.");
        Ok(())
    }

    /// Run until Ctrl+C
    pub async fn start(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Save state and release the store. Returns false if it was already closed.
    pub fn close(&mut self) -> Result<bool> {
        match self.store.take() {
            Some(store) => {
                store.save_state(&self.state)?;
                store.close()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BurnMarker;
    use async_trait::async_trait;
    use burn_bittensor::{MockChain, SubmitWait};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const OWNER: &str = "5OwnerHotkey";

    fn validator(chain: MockChain) -> Validator<MockChain> {
        Validator::new(
            ValidatorConfig::default(),
            chain,
            StateStore::temporary().unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_burn_uid_resolves_owner() {
        let chain = MockChain::new(7)
            .with_neuron("5Miner", 1)
            .with_owner_uid(OWNER, 5);
        let v = validator(chain);

        assert_eq!(v.get_burn_uid().await.unwrap(), 5);
        assert_eq!(v.chain().snapshot().owner_queries, 1);
    }

    #[tokio::test]
    async fn test_get_burn_uid_owner_missing_from_metagraph() {
        let chain = MockChain::new(7).with_owner(OWNER);
        let v = validator(chain);

        match v.get_burn_uid().await {
            Err(ValidatorError::BurnUidNotFound { hotkey, netuid }) => {
                assert_eq!(hotkey, OWNER);
                assert_eq!(netuid, 7);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_burn_weights_targets_owner_uid() {
        let chain = MockChain::new(7).with_owner_uid(OWNER, 5);
        let mut v = validator(chain);

        let report = v.set_burn_weights().await.unwrap();

        assert_eq!(report.uid, 5);
        assert_eq!(report.weights, vec![1.0]);
        assert!(report.outcome.is_success());

        let submissions = v.chain().snapshot().submissions;
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            submissions[0],
            WeightSubmission {
                netuid: 7,
                uids: vec![5],
                weights: vec![u16::MAX],
                version_key: 187,
                wait: SubmitWait::None,
            }
        );
        assert_eq!(v.state().burn_uid, Some(5));
    }

    #[tokio::test]
    async fn test_rejected_submission_is_not_an_error() {
        let chain = MockChain::new(7)
            .with_owner_uid(OWNER, 0)
            .with_outcome(SubmitOutcome::Rejected {
                message: "SettingWeightsTooFast".into(),
            });
        let mut v = validator(chain);

        let report = v.set_burn_weights().await.unwrap();
        assert_eq!(
            report.outcome,
            SubmitOutcome::Rejected {
                message: "SettingWeightsTooFast".into()
            }
        );
        assert_eq!(v.chain().snapshot().submissions.len(), 1);
    }

    #[tokio::test]
    async fn test_tick_burns_once_per_interval() {
        let chain = MockChain::new(1).with_owner_uid(OWNER, 3);
        let mut v = validator(chain);

        let first = v.tick().await.unwrap();
        assert!(first.burn.is_some());
        let second = v.tick().await.unwrap();
        assert!(second.burn.is_none());

        assert_eq!(v.chain().snapshot().syncs, 2);
        assert_eq!(v.chain().snapshot().submissions.len(), 1);
        assert_eq!(v.state().step, 2);
        assert!(v.state().marker.last_burn_at.is_some());
    }

    #[tokio::test]
    async fn test_tick_sync_failure_skips_burn() {
        let chain = MockChain::new(1).with_owner_uid(OWNER, 3).failing_sync();
        let mut v = validator(chain);

        let err = v.tick().await.unwrap_err();
        assert!(matches!(err, ValidatorError::Sync(_)));
        assert!(err.is_runtime());
        assert!(v.chain().snapshot().submissions.is_empty());
        assert_eq!(v.state().step, 0);
    }

    #[tokio::test]
    async fn test_unresolved_owner_keeps_marker() {
        let chain = MockChain::new(1).with_owner("5Unknown");
        let mut v = validator(chain);

        let err = v.tick().await.unwrap_err();
        assert!(err.is_runtime());
        assert_eq!(v.state().marker, BurnMarker::default());
    }

    #[tokio::test]
    async fn test_restart_inside_interval_does_not_burn() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path().join("state")).unwrap();

        let mut marker = BurnMarker::default();
        marker.record(chrono::Utc::now().timestamp(), 10);
        store
            .save_state(&ValidatorState {
                marker,
                step: 4,
                last_block: 10,
                burn_uid: Some(3),
            })
            .unwrap();

        let chain = MockChain::new(1).with_owner_uid(OWNER, 3);
        let mut v = Validator::new(ValidatorConfig::default(), chain, store).unwrap();
        assert_eq!(v.state().step, 4);

        let outcome = v.tick().await.unwrap();
        assert!(outcome.burn.is_none());
        assert_eq!(v.state().step, 5);
        assert!(v.chain().snapshot().submissions.is_empty());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut v = validator(MockChain::new(1));
        assert!(!v.is_closed());
        assert!(v.close().unwrap());
        assert!(v.is_closed());
        assert!(!v.close().unwrap());
        assert!(matches!(v.save_state(), Err(ValidatorError::Storage(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ValidatorConfig {
            tick_ms: 0,
            ..Default::default()
        };
        let result = Validator::new(config, MockChain::new(1), StateStore::temporary().unwrap());
        assert!(matches!(result, Err(ValidatorError::Config(_))));
    }

    struct CountingForward(Arc<AtomicUsize>);

    #[async_trait]
    impl ForwardPass for CountingForward {
        async fn forward(&mut self, _snapshot: &SyncSnapshot) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingForward;

    #[async_trait]
    impl ForwardPass for FailingForward {
        async fn forward(&mut self, _snapshot: &SyncSnapshot) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("no miners"))
        }
    }

    #[tokio::test]
    async fn test_forward_delegates() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut v = validator(MockChain::new(1))
            .with_forward(Box::new(CountingForward(counter.clone())));

        v.forward().await.unwrap();
        v.forward().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        let mut failing = validator(MockChain::new(1)).with_forward(Box::new(FailingForward));
        let err = failing.forward().await.unwrap_err();
        assert!(matches!(err, ValidatorError::Forward(ref m) if m.contains("no miners")));
    }

    #[tokio::test]
    async fn test_default_forward_is_noop() {
        let mut v = validator(MockChain::new(1));
        v.forward().await.unwrap();
        assert!(v.chain().snapshot().submissions.is_empty());
    }
}
