//! Foglio Page Cache
//!
//! A single-layer TTL cache holding rendered global feed pages:
//!
//! - keyed by route path and resolved page number
//! - entries live for a fixed TTL and are evicted LRU beyond a size cap
//! - writes never invalidate; only publishing a post or an administrative
//!   flush empties the cache
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `foglio.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 20
//! max_pages = 64
//! ```

mod clock;
mod config;
mod keys;
mod lock;
mod middleware;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use keys::PageKey;
pub use middleware::{CacheState, page_cache_layer};
pub use store::{CachedPage, PageCache};
