//! Sweep Metrics
//!
//! Counters for scans, expiries and callback failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector shared between the store and its sweeper
#[derive(Debug, Default)]
pub struct SweepMetrics {
    /// Completed sweeper scans
    scans: AtomicU64,

    /// Entries found expired (callback dispatched)
    expired: AtomicU64,

    /// Expired entries actually removed
    removed: AtomicU64,

    /// Callbacks that returned an error or panicked
    callback_failures: AtomicU64,

    /// Callbacks dispatched by `flush`
    flushed: AtomicU64,
}

/// Point-in-time copy of [`SweepMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub scans: u64,
    pub expired: u64,
    pub removed: u64,
    pub callback_failures: u64,
    pub flushed: u64,
}

impl SweepMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_scan(&self, expired: usize, removed: usize) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.expired.fetch_add(expired as u64, Ordering::Relaxed);
        self.removed.fetch_add(removed as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_callback_failure(&self) {
        self.callback_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self, dispatched: usize) {
        self.flushed.fetch_add(dispatched as u64, Ordering::Relaxed);
    }

    /// Get completed scan count
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Get failed callback count
    pub fn callback_failures(&self) -> u64 {
        self.callback_failures.load(Ordering::Relaxed)
    }

    /// Get a copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scans: self.scans.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            flushed: self.flushed.load(Ordering::Relaxed),
        }
    }

    /// Get a summary of metrics
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Scans: {} | Expired: {} (removed {}) | Callback failures: {} | Flushed: {}",
            s.scans, s.expired, s.removed, s.callback_failures, s.flushed
        )
    }
}
