//! Target split for browser primitives.
//!
//! Every function here routes to the `wasm32` implementation or to a native fallback with the
//! same signature, so the adapters above compile and unit-test on the host.

use std::{future::Future, pin::Pin, rc::Rc};

use shim_host::{IntakeDialogConfig, KeyStroke};

use crate::intake::IntakeSignal;

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

pub use imp::ListenerGuard;

/// Work handed to an event's `waitUntil`/`respondWith`.
pub type EventWork<T> = Pin<Box<dyn Future<Output = Result<T, String>>>>;

pub fn build_get_request(url: &str) -> Result<web_sys::Request, String> {
    imp::build_get_request(url)
}

pub async fn fetch_request(request: &web_sys::Request) -> Result<web_sys::Response, String> {
    imp::fetch_request(request).await
}

pub async fn cache_bucket_exists(bucket: &str) -> Result<bool, String> {
    imp::cache_bucket_exists(bucket).await
}

pub async fn cache_bucket_put_all(
    bucket: &str,
    entries: Vec<(String, web_sys::Response)>,
) -> Result<(), String> {
    imp::cache_bucket_put_all(bucket, entries).await
}

pub async fn cache_bucket_match(
    bucket: &str,
    url: &str,
) -> Result<Option<web_sys::Response>, String> {
    imp::cache_bucket_match(bucket, url).await
}

pub async fn cache_bucket_names() -> Result<Vec<String>, String> {
    imp::cache_bucket_names().await
}

pub async fn cache_bucket_delete(bucket: &str) -> Result<bool, String> {
    imp::cache_bucket_delete(bucket).await
}

pub fn extend_event_lifetime(
    event: &web_sys::ExtendableEvent,
    work: EventWork<()>,
) -> Result<(), String> {
    imp::extend_event_lifetime(event, work)
}

pub fn respond_to_fetch(
    event: &web_sys::FetchEvent,
    work: EventWork<web_sys::Response>,
) -> Result<(), String> {
    imp::respond_to_fetch(event, work)
}

/// Registers the service worker script at `script_url` and resolves to its scope.
///
/// # Errors
///
/// Returns an error when registration is rejected or no browser is available.
pub async fn register_service_worker(script_url: &str) -> Result<String, String> {
    imp::register_service_worker(script_url).await
}

pub fn has_native_save() -> bool {
    imp::has_native_save()
}

pub fn native_save(bytes: &[u8], mime_type: &str, filename: &str) -> Result<(), String> {
    imp::native_save(bytes, mime_type, filename)
}

pub fn anchor_supports_download() -> bool {
    imp::anchor_supports_download()
}

pub fn file_reader_available() -> bool {
    imp::file_reader_available()
}

pub fn legacy_safari_quirk() -> bool {
    imp::legacy_safari_quirk()
}

pub fn user_agent() -> String {
    imp::user_agent()
}

pub fn create_object_url(bytes: &[u8], mime_type: &str) -> Result<String, String> {
    imp::create_object_url(bytes, mime_type)
}

pub fn revoke_object_url(url: &str) {
    imp::revoke_object_url(url)
}

pub fn click_download_anchor(url: &str, filename: &str) -> Result<(), String> {
    imp::click_download_anchor(url, filename)
}

pub fn open_window(url: &str) -> bool {
    imp::open_window(url)
}

pub fn navigate(url: &str) -> Result<(), String> {
    imp::navigate(url)
}

pub async fn read_blob_as_data_url(bytes: &[u8], mime_type: &str) -> Result<String, String> {
    imp::read_blob_as_data_url(bytes, mime_type).await
}

pub fn set_timeout(delay_ms: u64, task: Box<dyn FnOnce()>) -> Result<(), String> {
    imp::set_timeout(delay_ms, task)
}

pub fn raise_uncaught(message: String) -> Result<(), String> {
    imp::raise_uncaught(message)
}

pub fn set_element_visible(element_id: &str, visible: bool) -> Result<(), String> {
    imp::set_element_visible(element_id, visible)
}

pub fn clear_file_input(input_id: &str) -> Result<(), String> {
    imp::clear_file_input(input_id)
}

pub fn watch_intake_dialog(
    config: &IntakeDialogConfig,
    sink: Rc<dyn Fn(IntakeSignal)>,
) -> Result<Vec<ListenerGuard>, String> {
    imp::watch_intake_dialog(config, sink)
}

pub async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    imp::read_file_bytes(file).await
}

pub fn watch_window_keydown(
    suppress: Rc<dyn Fn(KeyStroke) -> bool>,
) -> Result<ListenerGuard, String> {
    imp::watch_window_keydown(suppress)
}
