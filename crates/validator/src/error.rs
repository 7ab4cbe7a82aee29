//! Error types for the validator

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Validator error types
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Subnet owner hotkey {hotkey} not found in metagraph of netuid {netuid}")]
    BurnUidNotFound { hotkey: String, netuid: u16 },

    #[error("Forward error: {0}")]
    Forward(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ValidatorError {
    /// Runtime faults are logged and the loop keeps going; anything else
    /// shuts the validator down.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            ValidatorError::Sync(_)
                | ValidatorError::Chain(_)
                | ValidatorError::BurnUidNotFound { .. }
                | ValidatorError::Forward(_)
        )
    }
}

impl From<bincode::Error> for ValidatorError {
    fn from(err: bincode::Error) -> Self {
        ValidatorError::Serialization(err.to_string())
    }
}
