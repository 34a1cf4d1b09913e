//! In-process caching of collection snapshots.
//!
//! Each service owns one [`CollectionCache`] per collection it reads. Entries
//! expire after the configured TTL and are dropped immediately after every
//! write made through the owning service:
//!
//! ```toml
//! [cache]
//! ttl_seconds = 300
//! ```

mod collection;
mod config;
mod lock;

pub use collection::CollectionCache;
pub use config::CacheConfig;
