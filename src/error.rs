//! Error Types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("store lock not acquired within {0:?}")]
    LockTimeout(Duration),
    #[error("sweeper thread is not running")]
    SweeperDead,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("store already destroyed")]
    AlreadyDestroyed,
    #[error("destroy called from the sweeper thread")]
    SweeperThread,
    #[error("failed to spawn sweeper thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    /// Failures caused by the lock or sweeper not cooperating in time.
    /// The operation can be retried.
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, Error::LockTimeout(_) | Error::SweeperDead)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
