//! Service-worker exports; each forwards its event to the offline cache controller.

use std::{cell::RefCell, rc::Rc};

use shim_host_web::{offline_cache, on_activate, on_fetch, on_install, WebOfflineCache};
use wasm_bindgen::prelude::*;

use crate::config::load_config;

thread_local! {
    static OFFLINE_CACHE: RefCell<Option<Rc<WebOfflineCache>>> = RefCell::new(None);
}

fn offline_cache_controller() -> Rc<WebOfflineCache> {
    OFFLINE_CACHE.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| {
                console_error_panic_hook::set_once();
                Rc::new(offline_cache(&load_config().offline_cache))
            })
            .clone()
    })
}

/// `install` listener.
#[wasm_bindgen]
pub fn service_worker_install(event: web_sys::ExtendableEvent) -> Result<(), JsValue> {
    on_install(offline_cache_controller(), &event).map_err(|err| JsValue::from_str(&err))
}

/// `activate` listener.
#[wasm_bindgen]
pub fn service_worker_activate(event: web_sys::ExtendableEvent) -> Result<(), JsValue> {
    on_activate(offline_cache_controller(), &event).map_err(|err| JsValue::from_str(&err))
}

/// `fetch` listener.
#[wasm_bindgen]
pub fn service_worker_fetch(event: web_sys::FetchEvent) -> Result<(), JsValue> {
    on_fetch(offline_cache_controller(), &event).map_err(|err| JsValue::from_str(&err))
}
