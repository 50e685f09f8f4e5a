//! Expiry Sweeper
//!
//! Background thread that periodically scans the store, runs the expiry
//! callback for every entry past the age threshold and removes it.

use crossbeam::channel::{self, select, Receiver, Sender};
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::store::Shared;
use crate::error::Result;

/// Handle to a running sweeper thread
pub(crate) struct Sweeper {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Start the sweeper thread for `shared`
    pub(crate) fn spawn<K, V>(shared: Arc<Shared<K, V>>) -> Result<Self>
    where
        K: Eq + Hash + Send + 'static,
        V: Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded(1);
        let interval = shared.config.poll_interval;

        let handle = thread::Builder::new()
            .name("timedmap-sweeper".to_string())
            .spawn(move || {
                info!(?interval, "Sweeper started");
                Self::run(&shared, interval, stop_rx);
                info!("Sweeper stopped");
            })?;

        Ok(Self { stop_tx, handle })
    }

    /// Sweeper main loop. A disconnected stop channel also ends it.
    fn run<K, V>(shared: &Shared<K, V>, interval: Duration, stop_rx: Receiver<()>)
    where
        K: Eq + Hash,
    {
        let ticker = channel::tick(interval);

        loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    let (expired, removed) = scan(shared);
                    shared.metrics.record_scan(expired, removed);
                    if expired > 0 {
                        debug!(expired, removed, "Processed expired entries");
                    }
                }
            }
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    pub(crate) fn thread_id(&self) -> ThreadId {
        self.handle.thread().id()
    }

    /// Signal stop and wait for the thread to exit.
    /// Returns false if the thread ended by panicking.
    pub(crate) fn stop(self) -> bool {
        // Fails only if the thread is already gone.
        let _ = self.stop_tx.send(());
        self.handle.join().is_ok()
    }
}

/// One scan over the store, holding its lock throughout.
///
/// Returns `(expired, removed)`.
pub(crate) fn scan<K, V>(shared: &Shared<K, V>) -> (usize, usize)
where
    K: Eq + Hash,
{
    let mut entries = shared.entries.lock();
    let now = Instant::now();
    let threshold = shared.config.age_threshold;
    let mut expired = 0;

    if shared.config.retain_after_action {
        for (key, entry) in entries.iter() {
            if entry.is_expired(now, threshold) {
                expired += 1;
                dispatch(shared, key, entry.value());
            }
        }
        return (expired, 0);
    }

    entries.retain(|key, entry| {
        if !entry.is_expired(now, threshold) {
            return true;
        }
        expired += 1;
        dispatch(shared, key, entry.value());
        false
    });
    (expired, expired)
}

/// Run the expiry callback for one entry, if any is configured.
///
/// Errors and panics are logged and counted, never propagated.
pub(crate) fn dispatch<K, V>(shared: &Shared<K, V>, key: &K, value: &V) {
    let Some(action) = shared.on_expire.as_ref() else {
        return;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| action(key, value))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            shared.metrics.record_callback_failure();
            warn!(error = %e, "Expiry callback failed");
        }
        Err(payload) => {
            shared.metrics.record_callback_failure();
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(panic = %msg, "Expiry callback panicked");
        }
    }
}
