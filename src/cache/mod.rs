//! Worker cache system.
//!
//! Holds lookups of worker records keyed by [`WorkerCacheKey`], including
//! negative lookups, and the per-key locks that serialize fills and writes.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1024
//! ```

mod config;
mod key_lock;
mod keys;
pub(crate) mod lock;
mod store;

pub use config::CacheConfig;
pub use key_lock::KeyLocks;
pub use keys::WorkerCacheKey;
pub use store::{CachedLookup, L0WorkerCache, WorkerCache};
