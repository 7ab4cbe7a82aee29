//! Persistent validator state using sled

use crate::{BurnMarker, Result, ValidatorError};
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, info};

const STATE_TREE: &str = "validator";
const STATE_KEY: &str = "state";

/// State that survives restarts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorState {
    /// Last burn push
    pub marker: BurnMarker,
    /// Loop iterations completed
    pub step: u64,
    /// Block seen at the last successful sync
    pub last_block: u64,
    /// UID the last burn targeted
    pub burn_uid: Option<u16>,
}

/// sled-backed store for `ValidatorState`
pub struct StateStore {
    db: Db,
    tree: Tree,
}

impl StateStore {
    /// Open or create the store at path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            ValidatorError::Storage(format!(
                "Failed to open database at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let store = Self::from_db(db)?;
        info!("State store opened at {}", path.as_ref().display());
        Ok(store)
    }

    /// In-memory store that is discarded on close
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| ValidatorError::Storage(format!("Failed to open temporary database: {}", e)))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        let tree = db
            .open_tree(STATE_TREE)
            .map_err(|e| ValidatorError::Storage(format!("Failed to open state tree: {}", e)))?;
        Ok(Self { db, tree })
    }

    /// Save validator state and flush it to disk
    pub fn save_state(&self, state: &ValidatorState) -> Result<()> {
        let data = bincode::serialize(state)?;

        self.tree
            .insert(STATE_KEY, data)
            .map_err(|e| ValidatorError::Storage(format!("Failed to save state: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| ValidatorError::Storage(format!("Failed to flush: {}", e)))?;

        debug!("State saved at step {}", state.step);
        Ok(())
    }

    /// Load validator state
    pub fn load_state(&self) -> Result<Option<ValidatorState>> {
        let data = self
            .tree
            .get(STATE_KEY)
            .map_err(|e| ValidatorError::Storage(format!("Failed to load state: {}", e)))?;

        match data {
            Some(bytes) => {
                let state: ValidatorState = bincode::deserialize(&bytes)?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Flush and release the database handle
    pub fn close(self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| ValidatorError::Storage(format!("Failed to flush on close: {}", e)))?;
        info!("State store closed");
        Ok(())
    }
}
