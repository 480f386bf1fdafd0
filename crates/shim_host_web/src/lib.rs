//! Browser (`wasm32`) implementations of the [`shim_host`] contracts.
//!
//! This crate binds the platform-neutral controllers to Web APIs: the Cache API and `fetch` for
//! the service worker, Blob URLs and anchors for saves, the DOM for the intake dialog, and a
//! window `keydown` listener for the key filter.
//!
//! Browser calls go through `bridge`, which routes to native fallbacks off `wasm32` so the
//! adapters build and unit-test on the host.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Adapter factories for page and service-worker wiring.
pub mod adapters;
mod bridge;
pub mod cache;
pub mod download;
pub mod intake;
pub mod keyboard;
pub mod service_worker;

pub use adapters::{
    build_page_services, download_shim, offline_cache, save_platform, scheduler, PageServices,
};
pub use bridge::register_service_worker;
pub use cache::{WebCacheStore, WebNetwork, WebRequest, WebResponse};
pub use download::{
    js_save_handlers, probe_platform, CapabilityReport, WebSavePlatform, WebScheduler,
};
pub use intake::{intake_controller, IntakeSignal, WebIntakeController, WebIntakeDialog};
pub use keyboard::{install_key_filter, key_filter_installed};
pub use service_worker::{on_activate, on_fetch, on_install, WebOfflineCache};
