//! Offline cache domain: request identity, bucket store and network contracts, and the
//! cache-first controller.

mod controller;
mod network;
mod request;
mod store;

pub use controller::{FetchOutcome, InstallReport, OfflineCacheController, ResponseSource};
pub use network::{MemoryNetwork, Network, NetworkFuture};
pub use request::{
    AssetManifest, CacheRequest, CachedResponse, RequestKey, RequestMethod, ResponseStatus,
};
pub use store::{CacheStore, CacheStoreFuture, MemoryCacheStore};
