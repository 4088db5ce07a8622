use thiserror::Error;

use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::trust::{HashError, VerifyError};

#[derive(Error, Debug)]
pub enum DualsigError {
    #[error("Verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Hash error: {0}")]
    Hash(#[from] HashError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("CLI error: {0}")]
    Cli(String),
}

impl DualsigError {
    /// Process exit code: 2 for a rejected update, 1 for everything else
    pub fn exit_code(&self) -> i32 {
        match self {
            DualsigError::Verify(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DualsigError>;
