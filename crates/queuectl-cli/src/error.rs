//! Operator-facing error taxonomy. Every variant carries the process exit
//! code spec.md §6 requires: zero on success, non-zero on input validation
//! failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Core(#[from] queuectl_core::CoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidInput(_) => 2,
            CliError::Core(_) => 1,
            CliError::Other(_) => 1,
        }
    }
}
