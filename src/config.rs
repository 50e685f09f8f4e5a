//! Store Configuration

use std::time::Duration;
use tracing::warn;

use crate::error::{Error, Result};

/// Configuration for a [`TimedStore`](crate::TimedStore) and its sweeper.
///
/// Immutable once the store is built.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Age at which an entry expires
    pub age_threshold: Duration,

    /// Time between sweeper scans
    pub poll_interval: Duration,

    /// Keep expired entries after the callback ran
    pub retain_after_action: bool,

    /// How long `clear` and `flush` wait for the store lock
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            age_threshold: Duration::from_secs(60),
            poll_interval: Duration::from_secs(15),
            retain_after_action: false,
            lock_timeout: Duration::from_secs(1),
        }
    }
}

impl StoreConfig {
    /// Create a config with the given age threshold and poll interval
    pub fn new(age_threshold: Duration, poll_interval: Duration) -> Self {
        Self {
            age_threshold,
            poll_interval,
            ..Self::default()
        }
    }

    /// Set the age at which entries expire
    pub fn with_age_threshold(mut self, age: Duration) -> Self {
        self.age_threshold = age;
        self
    }

    /// Set the sweeper poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Keep or remove entries after the expiry callback
    pub fn with_retain_after_action(mut self, retain: bool) -> Self {
        self.retain_after_action = retain;
        self
    }

    /// Set the lock wait budget for `clear` and `flush`
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Reject non-positive durations.
    ///
    /// A poll interval above a quarter of the age threshold is allowed but
    /// logged, since eviction can then lag the threshold by a full interval.
    pub fn validate(&self) -> Result<()> {
        if self.age_threshold.is_zero() {
            return Err(Error::InvalidConfig("age_threshold must be positive".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig("poll_interval must be positive".into()));
        }
        if self.lock_timeout.is_zero() {
            return Err(Error::InvalidConfig("lock_timeout must be positive".into()));
        }
        if self.poll_interval > self.age_threshold / 4 {
            warn!(
                poll_interval = ?self.poll_interval,
                age_threshold = ?self.age_threshold,
                "poll interval exceeds a quarter of the age threshold"
            );
        }
        Ok(())
    }
}
