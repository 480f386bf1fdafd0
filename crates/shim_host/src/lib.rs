//! Platform-neutral core of the browser integration shim.
//!
//! This crate owns the state machines behind the page and service-worker glue: the versioned
//! offline cache, the tiered download shim, the file intake dialog session, and the keyboard
//! suppression policy. Every browser capability is reached through an injected trait so the
//! controllers run unchanged against the in-memory fakes shipped here and the Web API adapters
//! in `shim_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod intake;
pub mod keyboard;
pub mod time;

pub use cache::{
    AssetManifest, CacheRequest, CacheStore, CacheStoreFuture, CachedResponse, FetchOutcome,
    InstallReport, MemoryCacheStore, MemoryNetwork, Network, NetworkFuture, OfflineCacheController,
    RequestKey, RequestMethod, ResponseSource, ResponseStatus,
};
pub use config::{
    DownloadConfig, IntakeDialogConfig, OfflineCacheConfig, ShimConfig, StaleBucketPolicy,
    DEFAULT_ASSET_PATHS, DEFAULT_CACHE_VERSION, DEFAULT_DOWNLOAD_FILENAME,
    DEFAULT_RELEASE_DELAY_MS,
};
pub use download::{
    DataUriFlavor, DownloadShim, ObjectHandle, PlatformProbe, ReadyState, SaveCapability,
    SaveEvent, SaveFuture, SaveHandler, SaveHandlers, SavePayload, SavePlatform, SaveQueue,
    SaveRequest, Scheduler,
};
pub use error::{CacheError, IntakeError, SaveError, SaveHandlerError};
pub use intake::{
    CancelTrigger, FileBuffer, IntakeCallback, IntakeController, IntakeDialog, IntakeOutcome,
    PendingRead, Visibility,
};
pub use keyboard::{KeyFilterPolicy, KeyStroke};
pub use time::{remaining_delay_ms, unix_time_ms_now};
