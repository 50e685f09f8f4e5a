//! Storage Engine
//!
//! Age-bounded key-value store with a background expiry sweeper.

mod entry;
mod store;
mod sweeper;

pub use store::TimedStore;
