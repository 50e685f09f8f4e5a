//! Timestamped Entry

use std::time::{Duration, Instant};

/// Stored value with its original insertion time
#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// Replace the value. `inserted_at` is left untouched.
    pub(crate) fn set_value(&mut self, value: V) {
        self.value = value;
    }

    pub(crate) fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    /// An entry exactly at the threshold counts as expired.
    pub(crate) fn is_expired(&self, now: Instant, threshold: Duration) -> bool {
        self.age(now) >= threshold
    }
}
