//! Age-Bounded Key-Value Store
//!
//! Single-lock hashmap whose entries are evicted by a background sweeper
//! once they reach the configured age.

use hashbrown::hash_map::Entry as Slot;
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::entry::Entry;
use super::sweeper::{self, Sweeper};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::metrics::SweepMetrics;

/// Callback run for each expired entry
pub(crate) type ExpireAction<K, V> = Arc<dyn Fn(&K, &V) -> anyhow::Result<()> + Send + Sync>;

/// State shared between the store handle and the sweeper thread
pub(crate) struct Shared<K, V> {
    pub(crate) entries: Mutex<HashMap<K, Entry<V>>>,
    pub(crate) config: StoreConfig,
    pub(crate) on_expire: Option<ExpireAction<K, V>>,
    pub(crate) metrics: SweepMetrics,
}

impl<K, V> Shared<K, V> {
    pub(crate) fn new(config: StoreConfig, on_expire: Option<ExpireAction<K, V>>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            on_expire,
            metrics: SweepMetrics::new(),
        }
    }
}

/// Thread-safe map whose entries expire a fixed age after insertion.
///
/// Every operation takes the same exclusive lock, and so does each sweeper
/// scan; the expiry callback runs while that lock is held. A callback must
/// therefore not call blocking operations (`set`, `get`, ...) on its own
/// store. `clear` and `flush` report [`Error::LockTimeout`] in that case.
///
/// The sweeper thread is stopped and joined by [`destroy`](Self::destroy)
/// or, failing that, on drop.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use timedmap::{StoreConfig, TimedStore};
///
/// let config = StoreConfig::new(Duration::from_secs(2), Duration::from_millis(500));
/// let store = TimedStore::with_action(config, |key: &String, value: &u32| {
///     println!("{key} expired with {value}");
///     Ok(())
/// })
/// .unwrap();
///
/// store.set("1".to_string(), 1);
/// assert!(store.contains("1"));
/// store.destroy().unwrap();
/// ```
pub struct TimedStore<K, V> {
    shared: Arc<Shared<K, V>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<K, V> TimedStore<K, V>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Create a store that evicts entries without a callback
    pub fn new(age_threshold: Duration, poll_interval: Duration) -> Result<Self> {
        Self::build(StoreConfig::new(age_threshold, poll_interval), None)
    }

    /// Create a store from a full configuration, without a callback
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create a store that runs `action(key, value)` for every expired entry.
    ///
    /// An `Err` or panic from `action` is logged and counted in
    /// [`metrics`](Self::metrics); the entry is still treated as processed.
    pub fn with_action<F>(config: StoreConfig, action: F) -> Result<Self>
    where
        F: Fn(&K, &V) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::build(config, Some(Arc::new(action)))
    }

    fn build(config: StoreConfig, on_expire: Option<ExpireAction<K, V>>) -> Result<Self> {
        config.validate()?;
        let shared = Arc::new(Shared::new(config, on_expire));
        let sweeper = Sweeper::spawn(shared.clone())?;
        Ok(Self {
            shared,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    /// Insert a value, or replace the value of an existing key.
    /// Replacing does not reset the entry's age.
    pub fn set(&self, key: K, value: V) {
        let mut entries = self.shared.entries.lock();
        match entries.entry(key) {
            Slot::Occupied(mut slot) => slot.get_mut().set_value(value),
            Slot::Vacant(slot) => {
                slot.insert(Entry::new(value));
            }
        }
    }

    /// Check if key is present
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.entries.lock().contains_key(key)
    }

    /// Time since `key` was first inserted
    pub fn age<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entries = self.shared.entries.lock();
        let now = Instant::now();
        entries.get(key).map(|entry| entry.age(now))
    }

    /// Get the number of live entries
    pub fn len(&self) -> usize {
        self.shared.entries.lock().len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete key, returns true if key existed
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.entries.lock().remove(key).is_some()
    }

    /// Remove every entry, returns count of removed entries
    pub fn clear(&self) -> Result<usize> {
        let mut entries = self.lock_bounded()?;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    /// Run the expiry callback on every entry regardless of age, without
    /// removing anything. Returns the number of callbacks dispatched.
    pub fn flush(&self) -> Result<usize> {
        if !self.is_sweeper_alive() {
            return Err(Error::SweeperDead);
        }

        let entries = self.lock_bounded()?;
        if self.shared.on_expire.is_none() {
            return Ok(0);
        }
        for (key, entry) in entries.iter() {
            sweeper::dispatch(&self.shared, key, entry.value());
        }
        let dispatched = entries.len();
        self.shared.metrics.record_flush(dispatched);
        Ok(dispatched)
    }

    fn lock_bounded(&self) -> Result<parking_lot::MutexGuard<'_, HashMap<K, Entry<V>>>> {
        let timeout = self.shared.config.lock_timeout;
        self.shared
            .entries
            .try_lock_for(timeout)
            .ok_or(Error::LockTimeout(timeout))
    }
}

impl<K, V: Clone> TimedStore<K, V>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Get a copy of the value. Does not affect the entry's age.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared
            .entries
            .lock()
            .get(key)
            .map(|entry| entry.value().clone())
    }
}

impl<K, V> TimedStore<K, V> {
    /// Stop the sweeper and wait for its thread to exit.
    ///
    /// Entries stay readable afterwards but no longer expire. A second call
    /// returns [`Error::AlreadyDestroyed`].
    pub fn destroy(&self) -> Result<()> {
        let sweeper = {
            let mut slot = self.sweeper.lock();
            if let Some(sweeper) = slot.as_ref() {
                if sweeper.thread_id() == thread::current().id() {
                    return Err(Error::SweeperThread);
                }
            }
            slot.take().ok_or(Error::AlreadyDestroyed)?
        };

        info!("Stopping sweeper");
        if !sweeper.stop() {
            warn!("Sweeper thread exited with a panic");
        }
        Ok(())
    }

    /// Check if the sweeper thread is still running
    pub fn is_sweeper_alive(&self) -> bool {
        self.sweeper.lock().as_ref().is_some_and(Sweeper::is_alive)
    }

    /// Get the store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Get the sweep metrics
    pub fn metrics(&self) -> &SweepMetrics {
        &self.shared.metrics
    }
}

impl<K, V> Drop for TimedStore<K, V> {
    fn drop(&mut self) {
        if self.sweeper.get_mut().is_none() {
            return;
        }
        // On the sweeper thread itself the handle is just dropped; the
        // disconnected stop channel ends the loop after the current scan.
        if let Err(e) = self.destroy() {
            warn!(error = %e, "Sweeper not joined on drop");
        }
    }
}

impl<K, V> fmt::Debug for TimedStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The sweeper thread may already hold the lock when called from a callback.
        let len = self
            .shared
            .entries
            .try_lock_for(self.shared.config.lock_timeout)
            .map(|entries| entries.len());
        let mut out = f.debug_struct("TimedStore");
        match len {
            Some(len) => out.field("len", &len),
            None => out.field("len", &format_args!("<locked>")),
        };
        out.field("config", &self.shared.config)
            .field("sweeper_alive", &self.is_sweeper_alive())
            .finish()
    }
}
