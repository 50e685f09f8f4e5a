//! TIMEDMAP Demo Binary
//!
//! Inserts a batch of keys, watches them expire and prints sweeper metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use clap::Parser;
use timedmap::{StoreConfig, TimedStore};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// TIMEDMAP Demo - Age-Bounded Map with Background Expiry
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Age in milliseconds at which entries expire
    #[arg(long, default_value_t = 2000)]
    age_ms: u64,

    /// Sweeper poll interval in milliseconds
    #[arg(long, default_value_t = 500)]
    poll_ms: u64,

    /// Number of keys to insert
    #[arg(short, long, default_value_t = 10)]
    keys: u32,

    /// Keep entries after the expiry callback ran
    #[arg(long, default_value_t = false)]
    retain: bool,

    /// How long to wait before checking again (0 = age + 2 polls)
    #[arg(long, default_value_t = 0)]
    wait_ms: u64,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("timedmap=info".parse()?))
        .init();

    let args = Args::parse();

    let config = StoreConfig::new(
        Duration::from_millis(args.age_ms),
        Duration::from_millis(args.poll_ms),
    )
    .with_retain_after_action(args.retain);

    let expired = Arc::new(AtomicU64::new(0));
    let counter = expired.clone();
    let store = TimedStore::with_action(config, move |key: &String, value: &u32| {
        counter.fetch_add(1, Ordering::Relaxed);
        info!(%key, value, "Entry expired");
        Ok(())
    })?;

    for i in 0..args.keys {
        store.set(i.to_string(), i);
    }
    info!(len = store.len(), contains_first = store.contains("0"), "Keys inserted");

    let wait = if args.wait_ms == 0 {
        Duration::from_millis(args.age_ms + 2 * args.poll_ms)
    } else {
        Duration::from_millis(args.wait_ms)
    };
    sleep(wait);

    info!(
        len = store.len(),
        contains_first = store.contains("0"),
        callbacks = expired.load(Ordering::Relaxed),
        "After {:?}",
        wait
    );
    println!("{}", store.metrics().summary());

    store.destroy()?;
    Ok(())
}
