//! Error taxonomy for the core engine.
//!
//! Per the propagation policy: input errors and store errors are the only
//! variants that ever leave the core as an `Err`. Job execution failures and
//! reaper requeues are absorbed into state transitions, never into this enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("job '{0}' already exists")]
    DuplicateJob(String),

    #[error("store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl CoreError {
    /// True for errors the worker loop should log and continue past rather
    /// than treat as fatal.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}
