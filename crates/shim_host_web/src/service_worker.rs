//! Service-worker lifecycle hooks driving the offline cache controller.
//!
//! Each hook hands the controller's work to the event (`waitUntil` or `respondWith`) and returns
//! immediately; log lines are advisory and never change which response is served.

use std::rc::Rc;

use leptos::logging::{log, warn};
use shim_host::OfflineCacheController;

use crate::{
    bridge,
    cache::{WebCacheStore, WebNetwork, WebRequest},
};

/// Offline cache controller over the Cache API and `fetch`.
pub type WebOfflineCache = OfflineCacheController<WebCacheStore, WebNetwork>;

/// Pre-caches the manifest for the `install` event.
///
/// # Errors
///
/// Returns an error when the event refuses the extension.
pub fn on_install(
    cache: Rc<WebOfflineCache>,
    event: &web_sys::ExtendableEvent,
) -> Result<(), String> {
    log!(
        "[sw] installing `{}` ({} assets)",
        cache.version(),
        cache.manifest().len()
    );
    bridge::extend_event_lifetime(
        event,
        Box::pin(async move {
            let report = cache.install().await.map_err(|err| {
                warn!("[sw] install failed: {err}");
                err.to_string()
            })?;
            if report.repaired {
                warn!("[sw] discarded incomplete cache `{}`", report.version);
            }
            if report.reused {
                log!("[sw] cache `{}` already populated", report.version);
            } else {
                log!(
                    "[sw] cached {} assets into `{}`",
                    report.cached.len(),
                    report.version
                );
            }
            Ok(())
        }),
    )
}

/// Applies the stale bucket policy for the `activate` event.
///
/// # Errors
///
/// Returns an error when the event refuses the extension.
pub fn on_activate(
    cache: Rc<WebOfflineCache>,
    event: &web_sys::ExtendableEvent,
) -> Result<(), String> {
    bridge::extend_event_lifetime(
        event,
        Box::pin(async move {
            let evicted = cache.activate().await.map_err(|err| {
                warn!("[sw] activate failed: {err}");
                err.to_string()
            })?;
            for bucket in evicted {
                log!("[sw] evicted stale cache `{bucket}`");
            }
            log!("[sw] serving from `{}`", cache.version());
            Ok(())
        }),
    )
}

/// Answers a `fetch` event cache-first.
///
/// A network failure on a miss rejects the response promise, which the browser reports to the
/// page as a network error.
///
/// # Errors
///
/// Returns an error when the event refuses the response.
pub fn on_fetch(cache: Rc<WebOfflineCache>, event: &web_sys::FetchEvent) -> Result<(), String> {
    let request = WebRequest::from(event.request());
    bridge::respond_to_fetch(
        event,
        Box::pin(async move {
            match cache.handle_fetch(&request).await {
                Ok(outcome) => {
                    log!("[sw] {} {}", outcome.source.as_str(), outcome.key);
                    Ok(outcome.response.into_raw())
                }
                Err(err) => {
                    warn!("[sw] {err}");
                    Err(err.to_string())
                }
            }
        }),
    )
}
