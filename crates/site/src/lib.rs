//! `wasm-bindgen` entry points for the TIC-80 web build.
//!
//! The page context calls the exports in `page`; the service worker script calls the exports in
//! `worker`. Both read the same embedded configuration.

mod config;
mod page;
mod worker;

pub use config::load_config;
pub use page::{boot_page, register_service_worker, save_as, save_capabilities, show_add_popup};
pub use worker::{service_worker_activate, service_worker_fetch, service_worker_install};
