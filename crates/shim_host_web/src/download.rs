//! Browser save primitives, timer scheduling, and capability probing for the download shim.

use leptos::logging::warn;
use serde::Serialize;
use shim_host::{
    unix_time_ms_now, PlatformProbe, ReadyState, SaveCapability, SaveEvent, SaveFuture,
    SaveHandler, SaveHandlerError, SaveHandlers, SavePayload, SavePlatform, Scheduler,
};
use wasm_bindgen::{JsCast, JsValue};

use crate::bridge;

#[derive(Debug, Clone, Copy, Default)]
/// Save platform over Blob URLs, anchors, `FileReader`, and window navigation.
pub struct WebSavePlatform;

impl SavePlatform for WebSavePlatform {
    fn native_save(&self, payload: &SavePayload, filename: &str) -> Result<(), String> {
        bridge::native_save(&payload.bytes, &payload.mime_type, filename)
    }

    fn create_object_url(&self, payload: &SavePayload) -> Result<String, String> {
        bridge::create_object_url(&payload.bytes, &payload.mime_type)
    }

    fn revoke_object_url(&self, url: &str) {
        bridge::revoke_object_url(url);
    }

    fn click_download_anchor(&self, url: &str, filename: &str) -> Result<(), String> {
        bridge::click_download_anchor(url, filename)
    }

    fn open_in_new_context(&self, url: &str) -> bool {
        bridge::open_window(url)
    }

    fn navigate_current(&self, url: &str) -> Result<(), String> {
        bridge::navigate(url)
    }

    fn read_as_data_uri<'a>(
        &'a self,
        payload: &'a SavePayload,
    ) -> SaveFuture<'a, Result<String, String>> {
        Box::pin(async move {
            bridge::read_blob_as_data_url(&payload.bytes, &payload.mime_type).await
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Scheduler over `setTimeout` and the window's uncaught-error channel.
pub struct WebScheduler;

impl Scheduler for WebScheduler {
    fn now_ms(&self) -> u64 {
        unix_time_ms_now()
    }

    fn schedule(&self, delay_ms: u64, task: Box<dyn FnOnce()>) {
        if let Err(err) = bridge::set_timeout(delay_ms, task) {
            warn!("[save] failed to schedule deferred task: {err}");
        }
    }

    fn report_error(&self, error: SaveHandlerError) {
        let message = error.to_string();
        if let Err(err) = bridge::raise_uncaught(message.clone()) {
            warn!("[save] {message} ({err})");
        }
    }
}

/// Probes the current window for save-related features.
pub fn probe_platform() -> PlatformProbe {
    PlatformProbe {
        native_save: bridge::has_native_save(),
        anchor_download: bridge::anchor_supports_download(),
        file_reader: bridge::file_reader_available(),
        legacy_safari: bridge::legacy_safari_quirk(),
        user_agent: bridge::user_agent(),
    }
}

/// Reads `on<event>` functions off a page listener object, e.g. `onwriteend`.
///
/// Each function is called with the event name and the numeric ready state. A function that
/// throws is reported like any other handler error. Anything but an object yields no handlers.
pub fn js_save_handlers(listeners: &JsValue) -> SaveHandlers {
    if !listeners.is_object() {
        return Vec::new();
    }
    SaveEvent::ALL
        .into_iter()
        .filter_map(|event| {
            let key = JsValue::from_str(&format!("on{event}"));
            let callback = js_sys::Reflect::get(listeners, &key)
                .ok()?
                .dyn_into::<js_sys::Function>()
                .ok()?;
            let handler: SaveHandler = Box::new(move |event: SaveEvent, state: ReadyState| {
                callback
                    .call2(
                        &JsValue::NULL,
                        &JsValue::from_str(event.as_str()),
                        &JsValue::from(state.code()),
                    )
                    .map(|_| ())
                    .map_err(|err| err.as_string().unwrap_or_else(|| format!("{err:?}")))
            });
            Some((event, handler))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Diagnostic snapshot of the probe and the tier it selected.
pub struct CapabilityReport {
    /// Selected tier token.
    pub capability: &'static str,
    /// Raw probe results.
    pub probe: PlatformProbe,
}

impl CapabilityReport {
    /// Selects the tier for `probe` and records both.
    pub fn new(probe: PlatformProbe) -> Self {
        Self {
            capability: SaveCapability::select(&probe).as_str(),
            probe,
        }
    }

    /// Converts the report into a plain JS object.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_js(&self) -> Result<JsValue, String> {
        serde_wasm_bindgen::to_value(self).map_err(|err| err.to_string())
    }
}
