//! Static-asset cache with network-first handling and offline fallback.
//!
//! Only successful GET responses for allow-listed static extensions are stored,
//! one entry per normalized URL. Each deployed version owns one named cache;
//! activating a version deletes every cache with a different name.

mod manager;
mod network;
mod policy;
mod storage;
mod types;

pub use manager::{CacheManager, LifecycleState};
pub use network::{HttpNetwork, Network};
pub use policy::CachePolicy;
pub use storage::{CacheStorage, SqliteCacheStorage};
pub use types::{AssetRequest, AssetResponse, CacheEntry, CachedEntry, ResponseSource};
