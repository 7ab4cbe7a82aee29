//! Bittensor client wrapper

use crate::{
    BittensorConfig, Chain, SubmitOutcome, SubmitWait, SyncSnapshot, WeightSubmission,
    SUBNET_OWNER_HOTKEY, SUBTENSOR_MODULE,
};
use anyhow::Result;
use async_trait::async_trait;
use bittensor_rs::chain::{signer_from_seed, BittensorClient, BittensorSigner, ExtrinsicWait};
use bittensor_rs::metagraph::{sync_metagraph, Metagraph};
use bittensor_rs::validator::utility::batch_set_mechanism_weights;
use subxt::dynamic::Value;
use subxt::{OnlineClient, PolkadotConfig};
use tracing::{debug, info};

/// Mechanism that carries the subnet's main incentive
const MAIN_MECHANISM: u8 = 0;

/// Wrapper around bittensor-rs client for the burn validator
pub struct SubtensorClient {
    config: BittensorConfig,
    client: Option<BittensorClient>,
    /// Second connection to the same endpoint, used only for raw storage
    /// reads. `BittensorClient` does not hand out its inner subxt client.
    storage: Option<OnlineClient<PolkadotConfig>>,
    signer: Option<BittensorSigner>,
    metagraph: Option<Metagraph>,
}

impl SubtensorClient {
    /// Create a new client (not connected yet)
    pub fn new(config: BittensorConfig) -> Self {
        Self {
            config,
            client: None,
            storage: None,
            signer: None,
            metagraph: None,
        }
    }

    /// Connect to Subtensor
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to Subtensor: {}", self.config.endpoint);

        let client = BittensorClient::new(&self.config.endpoint).await?;
        self.client = Some(client);

        let storage = OnlineClient::<PolkadotConfig>::from_url(&self.config.endpoint).await?;
        self.storage = Some(storage);

        info!("Connected to Subtensor");
        Ok(())
    }

    /// Set the signer from a seed phrase or key
    pub fn set_signer(&mut self, seed: &str) -> Result<()> {
        let signer = signer_from_seed(seed)?;
        info!("Bittensor hotkey: {}", signer.account_id());
        self.signer = Some(signer);
        Ok(())
    }

    /// Get the inner client
    pub fn client(&self) -> Result<&BittensorClient> {
        self.client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Not connected to Subtensor"))
    }

    /// Get the signer (returns Result)
    pub fn signer(&self) -> Result<&BittensorSigner> {
        self.signer
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Signer not set"))
    }

    /// Get the signer (returns Option)
    pub fn get_signer(&self) -> Option<&BittensorSigner> {
        self.signer.as_ref()
    }

    fn storage(&self) -> Result<&OnlineClient<PolkadotConfig>> {
        self.storage
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Not connected to Subtensor"))
    }

    /// Get cached metagraph (sync first if needed)
    pub fn metagraph(&self) -> Option<&Metagraph> {
        self.metagraph.as_ref()
    }

    fn lookup_uid_in_metagraph(&self, hotkey: &str) -> Option<u16> {
        let metagraph = self.metagraph.as_ref()?;
        find_uid(
            metagraph.neurons.iter().map(|(uid, neuron)| {
                let neuron_hotkey: &[u8; 32] = neuron.hotkey.as_ref();
                (*uid, neuron_hotkey)
            }),
            hotkey,
        )
    }
}

/// Find the UID whose hotkey bytes match an SS58 address
pub fn find_uid<'a, I>(neurons: I, hotkey: &str) -> Option<u16>
where
    I: IntoIterator<Item = (u64, &'a [u8; 32])>,
{
    use sp_core::crypto::Ss58Codec;
    let account = sp_core::crypto::AccountId32::from_ss58check(hotkey).ok()?;
    let account_bytes: &[u8; 32] = account.as_ref();

    neurons
        .into_iter()
        .find(|(_, neuron_hotkey)| *neuron_hotkey == account_bytes)
        .and_then(|(uid, _)| u16::try_from(uid).ok())
}

fn extrinsic_wait(wait: SubmitWait) -> ExtrinsicWait {
    match wait {
        SubmitWait::None => ExtrinsicWait::None,
        SubmitWait::Inclusion => ExtrinsicWait::Included,
        SubmitWait::Finalization => ExtrinsicWait::Finalized,
    }
}

#[async_trait]
impl Chain for SubtensorClient {
    fn netuid(&self) -> u16 {
        self.config.netuid
    }

    async fn sync(&mut self) -> Result<SyncSnapshot> {
        let client = self.client()?;
        let metagraph = sync_metagraph(client, self.config.netuid).await?;
        let snapshot = SyncSnapshot {
            block: metagraph.block,
            neurons: metagraph.n,
        };
        debug!(
            "Metagraph synced: block={}, neurons={}",
            snapshot.block, snapshot.neurons
        );
        self.metagraph = Some(metagraph);
        Ok(snapshot)
    }

    async fn subnet_owner_hotkey(&self) -> Result<String> {
        let storage = self.storage()?;
        let query = subxt::dynamic::storage(
            SUBTENSOR_MODULE,
            SUBNET_OWNER_HOTKEY,
            vec![Value::u128(self.config.netuid as u128)],
        );

        let value = storage
            .storage()
            .at_latest()
            .await?
            .fetch(&query)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("No subnet owner hotkey for netuid {}", self.config.netuid)
            })?;

        let owner: subxt::utils::AccountId32 = value.as_type()?;
        Ok(owner.to_string())
    }

    fn uid_for_hotkey(&self, hotkey: &str) -> Option<u16> {
        self.lookup_uid_in_metagraph(hotkey)
    }

    async fn set_weights(&self, submission: &WeightSubmission) -> Result<SubmitOutcome> {
        let client = self.client()?;
        let signer = self.signer()?;

        debug!(
            "Submitting weights: netuid={}, uids={:?}, weights={:?}, version_key={}, wait={}",
            submission.netuid,
            submission.uids,
            submission.weights,
            submission.version_key,
            submission.wait
        );

        let outcome = match batch_set_mechanism_weights(
            client,
            signer,
            submission.netuid,
            vec![(
                MAIN_MECHANISM,
                submission.uids.clone(),
                submission.weights.clone(),
            )],
            submission.version_key,
            extrinsic_wait(submission.wait),
        )
        .await
        {
            Ok(tx_hash) => SubmitOutcome::Submitted {
                tx_hash: Some(tx_hash),
            },
            Err(e) => SubmitOutcome::Rejected {
                message: e.to_string(),
            },
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_core::crypto::{AccountId32, Ss58Codec};

    fn ss58(bytes: [u8; 32]) -> String {
        AccountId32::new(bytes).to_ss58check()
    }

    #[test]
    fn test_set_signer_initializes_signer_field() {
        let mut client = SubtensorClient::new(BittensorConfig::local(33));
        client.set_signer("//Alice").expect("set signer");
        assert!(client.get_signer().is_some());
    }

    #[test]
    fn test_client_returns_error_when_not_connected() {
        let client = SubtensorClient::new(BittensorConfig::local(9));
        assert!(client.client().is_err());
        assert!(client.signer().is_err());
        assert_eq!(client.netuid(), 9);
    }

    #[tokio::test]
    async fn test_chain_calls_fail_when_not_connected() {
        let mut client = SubtensorClient::new(BittensorConfig::local(9));
        assert!(client.sync().await.is_err());
        assert!(client.subnet_owner_hotkey().await.is_err());

        let submission = WeightSubmission {
            netuid: 9,
            uids: vec![0],
            weights: vec![u16::MAX],
            version_key: 1,
            wait: SubmitWait::None,
        };
        assert!(client.set_weights(&submission).await.is_err());
    }

    #[test]
    fn test_uid_for_hotkey_without_metagraph() {
        let client = SubtensorClient::new(BittensorConfig::local(2));
        assert!(client.metagraph().is_none());
        assert_eq!(client.uid_for_hotkey(&ss58([7u8; 32])), None);
    }

    #[test]
    fn test_find_uid_matches_hotkey_bytes() {
        let owner = [7u8; 32];
        let other = [9u8; 32];
        let neurons = vec![(3u64, &other), (5u64, &owner)];

        assert_eq!(find_uid(neurons.clone(), &ss58(owner)), Some(5));
        assert_eq!(find_uid(neurons, &ss58([1u8; 32])), None);
    }

    #[test]
    fn test_find_uid_rejects_invalid_ss58() {
        let owner = [7u8; 32];
        assert_eq!(find_uid(vec![(0u64, &owner)], "not-an-address"), None);
    }

    #[test]
    fn test_find_uid_skips_uids_out_of_range() {
        let owner = [4u8; 32];
        let neurons = vec![(u64::from(u16::MAX) + 1, &owner)];
        assert_eq!(find_uid(neurons, &ss58(owner)), None);
    }

    #[test]
    fn test_extrinsic_wait_mapping() {
        assert!(matches!(
            extrinsic_wait(SubmitWait::None),
            ExtrinsicWait::None
        ));
        assert!(matches!(
            extrinsic_wait(SubmitWait::Inclusion),
            ExtrinsicWait::Included
        ));
        assert!(matches!(
            extrinsic_wait(SubmitWait::Finalization),
            ExtrinsicWait::Finalized
        ));
    }
}
