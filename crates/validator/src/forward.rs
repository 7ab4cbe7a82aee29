//! Forward pass hook
//!
//! A forward pass queries miners and scores them. The burn validator ships
//! without one; `NoopForward` keeps the hook in place for subnets that add
//! their own.

use async_trait::async_trait;
use burn_bittensor::SyncSnapshot;
use tracing::debug;

#[async_trait]
pub trait ForwardPass: Send + Sync {
    async fn forward(&mut self, snapshot: &SyncSnapshot) -> anyhow::Result<()>;
}

/// Forward pass that does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopForward;

#[async_trait]
impl ForwardPass for NoopForward {
    async fn forward(&mut self, snapshot: &SyncSnapshot) -> anyhow::Result<()> {
        debug!("Forward pass skipped at block {}", snapshot.block);
        Ok(())
    }
}
