//! Page-context exports called by the hosted application's JS glue.

use std::{cell::RefCell, rc::Rc};

use leptos::logging::{log, warn};
use shim_host::{download::OCTET_STREAM, SaveRequest};
use shim_host_web::{build_page_services, install_key_filter, js_save_handlers, PageServices};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::config::load_config;

thread_local! {
    static PAGE: RefCell<Option<Rc<PageServices>>> = RefCell::new(None);
}

fn page_services() -> Rc<PageServices> {
    PAGE.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| Rc::new(build_page_services(&load_config())))
            .clone()
    })
}

/// Wires the page: panic hook, save tier probe, and the key-down filter.
#[wasm_bindgen]
pub fn boot_page() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let services = page_services();
    if install_key_filter(services.keyboard.clone()).map_err(|err| JsValue::from_str(&err))? {
        log!("[keyboard] key filter installed");
    }
    Ok(())
}

/// Queues a save of `bytes` as `filename` and resolves once it fired `writeend`.
///
/// `listeners` may carry `onwritestart`, `onprogress`, `onwrite`, `onerror` and `onwriteend`;
/// each is called with the event name and the numeric ready state. Saves run in call order.
#[wasm_bindgen]
pub fn save_as(
    bytes: Vec<u8>,
    filename: String,
    mime_type: Option<String>,
    is_binary: bool,
    listeners: JsValue,
) -> js_sys::Promise {
    let request = SaveRequest {
        bytes,
        mime_type: mime_type.unwrap_or_else(|| OCTET_STREAM.to_string()),
        filename,
        is_binary,
    };
    let handlers = js_save_handlers(&listeners);
    let services = page_services();
    future_to_promise(async move {
        services
            .download
            .save(request, handlers)
            .await
            .map_err(|err| {
                warn!("[save] {err}");
                JsValue::from_str(&err.to_string())
            })?;
        Ok(JsValue::UNDEFINED)
    })
}

/// Opens the file intake dialog; `callback(filename, bytes)` receives `(null, null)` on cancel.
#[wasm_bindgen]
pub fn show_add_popup(callback: js_sys::Function) -> Result<(), JsValue> {
    page_services()
        .intake
        .request_file(Box::new(move |outcome| {
            let (filename, buffer) = outcome.into_parts();
            let filename = filename.map_or(JsValue::NULL, |name| JsValue::from_str(&name));
            let buffer = buffer.map_or(JsValue::NULL, |buffer| {
                js_sys::Uint8Array::from(buffer.as_bytes()).into()
            });
            if let Err(err) = callback.call2(&JsValue::NULL, &filename, &buffer) {
                warn!("[intake] callback threw: {err:?}");
            }
        }))
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Registers the offline service worker and resolves to its scope.
#[wasm_bindgen]
pub fn register_service_worker(script_url: String) -> js_sys::Promise {
    future_to_promise(async move {
        let scope = shim_host_web::register_service_worker(&script_url)
            .await
            .map_err(|err| JsValue::from_str(&err))?;
        log!("[sw] registered `{script_url}` for {scope}");
        Ok(JsValue::from_str(&scope))
    })
}

/// Returns the save probe results and the selected tier.
#[wasm_bindgen]
pub fn save_capabilities() -> Result<JsValue, JsValue> {
    page_services()
        .capability
        .to_js()
        .map_err(|err| JsValue::from_str(&err))
}
