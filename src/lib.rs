//! TIMEDMAP - Age-Bounded Concurrent Map
//!
//! Entries are timestamped on insertion and evicted by a background sweeper
//! thread once they reach a configured age, optionally running a callback
//! for each one first.

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use metrics::{MetricsSnapshot, SweepMetrics};
pub use storage::TimedStore;
