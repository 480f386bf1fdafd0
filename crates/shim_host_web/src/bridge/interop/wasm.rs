use std::cell::RefCell;

use futures::{channel::oneshot, future::try_join_all};
use js_sys::{Array, Reflect, Uint8Array};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use super::*;

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

fn js_error(context: &str, err: JsValue) -> String {
    format!("{context}: {err:?}")
}

fn window() -> Result<web_sys::Window, String> {
    web_sys::window().ok_or_else(|| "window is unavailable".to_string())
}

fn document() -> Result<web_sys::Document, String> {
    window()?
        .document()
        .ok_or_else(|| "document is unavailable".to_string())
}

/// DOM listener registration; removes the listener when dropped.
pub struct ListenerGuard {
    target: web_sys::EventTarget,
    event_type: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            self.event_type,
            self.callback.as_ref().unchecked_ref(),
        );
    }
}

fn listen(
    target: &web_sys::EventTarget,
    event_type: &'static str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<ListenerGuard, String> {
    let handler: Box<dyn FnMut(web_sys::Event)> = Box::new(handler);
    let callback = Closure::wrap(handler);
    target
        .add_event_listener_with_callback(event_type, callback.as_ref().unchecked_ref())
        .map_err(|err| js_error(&format!("failed to listen for `{event_type}`"), err))?;
    Ok(ListenerGuard {
        target: target.clone(),
        event_type,
        callback,
    })
}

fn cache_storage() -> Result<web_sys::CacheStorage, String> {
    Reflect::get(&js_sys::global(), &JsValue::from_str("caches"))
        .map_err(|err| js_error("caches lookup failed", err))?
        .dyn_into::<web_sys::CacheStorage>()
        .map_err(|_| "Cache API is unavailable".to_string())
}

async fn open_bucket(bucket: &str) -> Result<web_sys::Cache, String> {
    JsFuture::from(cache_storage()?.open(bucket))
        .await
        .map_err(|err| js_error(&format!("caches.open(`{bucket}`) failed"), err))?
        .dyn_into::<web_sys::Cache>()
        .map_err(|_| "caches.open returned a non-Cache value".to_string())
}

pub fn build_get_request(url: &str) -> Result<web_sys::Request, String> {
    web_sys::Request::new_with_str(url)
        .map_err(|err| js_error(&format!("invalid request URL `{url}`"), err))
}

pub async fn fetch_request(request: &web_sys::Request) -> Result<web_sys::Response, String> {
    let promise = match js_sys::global().dyn_into::<web_sys::WorkerGlobalScope>() {
        Ok(scope) => scope.fetch_with_request(request),
        Err(global) => global
            .unchecked_into::<web_sys::Window>()
            .fetch_with_request(request),
    };
    JsFuture::from(promise)
        .await
        .map_err(|err| js_error("fetch failed", err))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| "fetch resolved to a non-Response value".to_string())
}

pub async fn cache_bucket_exists(bucket: &str) -> Result<bool, String> {
    let value = JsFuture::from(cache_storage()?.has(bucket))
        .await
        .map_err(|err| js_error("caches.has failed", err))?;
    Ok(value.as_bool().unwrap_or(false))
}

pub async fn cache_bucket_put_all(
    bucket: &str,
    entries: Vec<(String, web_sys::Response)>,
) -> Result<(), String> {
    let cache = open_bucket(bucket).await?;
    try_join_all(
        entries
            .iter()
            .map(|(url, response)| JsFuture::from(cache.put_with_str(url, response))),
    )
    .await
    .map_err(|err| js_error(&format!("cache.put into `{bucket}` failed"), err))?;
    Ok(())
}

pub async fn cache_bucket_match(
    bucket: &str,
    url: &str,
) -> Result<Option<web_sys::Response>, String> {
    // `caches.open` creates missing buckets, so probe first.
    if !cache_bucket_exists(bucket).await? {
        return Ok(None);
    }
    let value = JsFuture::from(open_bucket(bucket).await?.match_with_str(url))
        .await
        .map_err(|err| js_error("cache.match failed", err))?;
    if value.is_undefined() {
        return Ok(None);
    }
    value
        .dyn_into::<web_sys::Response>()
        .map(Some)
        .map_err(|_| "cache.match resolved to a non-Response value".to_string())
}

pub async fn cache_bucket_names() -> Result<Vec<String>, String> {
    let value = JsFuture::from(cache_storage()?.keys())
        .await
        .map_err(|err| js_error("caches.keys failed", err))?;
    Ok(Array::from(&value)
        .iter()
        .filter_map(|name| name.as_string())
        .collect())
}

pub async fn cache_bucket_delete(bucket: &str) -> Result<bool, String> {
    let value = JsFuture::from(cache_storage()?.delete(bucket))
        .await
        .map_err(|err| js_error("caches.delete failed", err))?;
    Ok(value.as_bool().unwrap_or(false))
}

pub fn extend_event_lifetime(
    event: &web_sys::ExtendableEvent,
    work: EventWork<()>,
) -> Result<(), String> {
    let promise = future_to_promise(async move {
        work.await
            .map(|()| JsValue::UNDEFINED)
            .map_err(|err| JsValue::from_str(&err))
    });
    event
        .wait_until(&promise)
        .map_err(|err| js_error("waitUntil failed", err))
}

pub fn respond_to_fetch(
    event: &web_sys::FetchEvent,
    work: EventWork<web_sys::Response>,
) -> Result<(), String> {
    let promise = future_to_promise(async move {
        work.await
            .map(JsValue::from)
            .map_err(|err| JsValue::from_str(&err))
    });
    event
        .respond_with(&promise)
        .map_err(|err| js_error("respondWith failed", err))
}

pub async fn register_service_worker(script_url: &str) -> Result<String, String> {
    let promise = window()?
        .navigator()
        .service_worker()
        .register(script_url);
    let registration = JsFuture::from(promise)
        .await
        .map_err(|err| js_error(&format!("failed to register `{script_url}`"), err))?
        .dyn_into::<web_sys::ServiceWorkerRegistration>()
        .map_err(|_| "register resolved to a non-registration value".to_string())?;
    Ok(registration.scope())
}

fn make_blob(bytes: &[u8], mime_type: &str) -> Result<web_sys::Blob, String> {
    let parts = Array::of1(&Uint8Array::from(bytes));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime_type);
    web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|err| js_error("failed to build blob", err))
}

pub fn has_native_save() -> bool {
    window()
        .map(|window| {
            Reflect::has(&window.navigator(), &JsValue::from_str("msSaveOrOpenBlob"))
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

pub fn native_save(bytes: &[u8], mime_type: &str, filename: &str) -> Result<(), String> {
    let navigator = window()?.navigator();
    let save = Reflect::get(&navigator, &JsValue::from_str("msSaveOrOpenBlob"))
        .map_err(|err| js_error("msSaveOrOpenBlob lookup failed", err))?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| "msSaveOrOpenBlob is not callable".to_string())?;
    let blob = make_blob(bytes, mime_type)?;
    save.call2(&navigator, &blob, &JsValue::from_str(filename))
        .map(|_| ())
        .map_err(|err| js_error("msSaveOrOpenBlob failed", err))
}

pub fn anchor_supports_download() -> bool {
    document()
        .and_then(|document| {
            document
                .create_element_ns(Some(XHTML_NS), "a")
                .map_err(|err| js_error("failed to create anchor", err))
        })
        .map(|anchor| Reflect::has(&anchor, &JsValue::from_str("download")).unwrap_or(false))
        .unwrap_or(false)
}

pub fn file_reader_available() -> bool {
    Reflect::has(&js_sys::global(), &JsValue::from_str("FileReader")).unwrap_or(false)
}

pub fn legacy_safari_quirk() -> bool {
    let global = js_sys::global();
    if Reflect::has(&global, &JsValue::from_str("safari")).unwrap_or(false) {
        return true;
    }
    Reflect::get(&global, &JsValue::from_str("HTMLElement"))
        .ok()
        .filter(|value| !value.is_undefined())
        .map(|value| {
            String::from(value.unchecked_into::<js_sys::Object>().to_string())
                .to_ascii_lowercase()
                .contains("constructor")
        })
        .unwrap_or(false)
}

pub fn user_agent() -> String {
    window()
        .ok()
        .and_then(|window| window.navigator().user_agent().ok())
        .unwrap_or_default()
}

pub fn create_object_url(bytes: &[u8], mime_type: &str) -> Result<String, String> {
    let blob = make_blob(bytes, mime_type)?;
    web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|err| js_error("URL.createObjectURL failed", err))
}

pub fn revoke_object_url(url: &str) {
    let _ = web_sys::Url::revoke_object_url(url);
}

pub fn click_download_anchor(url: &str, filename: &str) -> Result<(), String> {
    let anchor = document()?
        .create_element_ns(Some(XHTML_NS), "a")
        .map_err(|err| js_error("failed to create anchor", err))?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| "created element is not an anchor".to_string())?;
    anchor.set_href(url);
    anchor.set_download(filename);
    let click =
        web_sys::MouseEvent::new("click").map_err(|err| js_error("failed to build click", err))?;
    anchor
        .dispatch_event(&click)
        .map(|_| ())
        .map_err(|err| js_error("anchor click failed", err))
}

pub fn open_window(url: &str) -> bool {
    window()
        .ok()
        .and_then(|window| window.open_with_url_and_target(url, "_blank").ok())
        .flatten()
        .is_some()
}

pub fn navigate(url: &str) -> Result<(), String> {
    window()?
        .location()
        .set_href(url)
        .map_err(|err| js_error("navigation failed", err))
}

enum ReadMode {
    DataUrl,
    ArrayBuffer,
}

async fn read_blob(blob: &web_sys::Blob, mode: ReadMode) -> Result<JsValue, String> {
    let reader =
        web_sys::FileReader::new().map_err(|err| js_error("failed to create file reader", err))?;
    let (tx, rx) = oneshot::channel::<Result<JsValue, String>>();
    let sender = Rc::new(RefCell::new(Some(tx)));

    let reader_for_load = reader.clone();
    let load_sender = sender.clone();
    let on_load = Closure::<dyn FnMut(web_sys::ProgressEvent)>::wrap(Box::new(move |_| {
        let result = reader_for_load
            .result()
            .map_err(|err| js_error("file reader result unavailable", err));
        if let Some(tx) = load_sender.borrow_mut().take() {
            let _ = tx.send(result);
        }
    }));
    reader.set_onload(Some(on_load.as_ref().unchecked_ref()));

    let on_error = Closure::<dyn FnMut(web_sys::ProgressEvent)>::wrap(Box::new(move |_| {
        if let Some(tx) = sender.borrow_mut().take() {
            let _ = tx.send(Err("file read failed".to_string()));
        }
    }));
    reader.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    match mode {
        ReadMode::DataUrl => reader.read_as_data_url(blob),
        ReadMode::ArrayBuffer => reader.read_as_array_buffer(blob),
    }
    .map_err(|err| js_error("failed to start file read", err))?;

    let result = rx
        .await
        .map_err(|_| "file read was interrupted".to_string())?;
    reader.set_onload(None);
    reader.set_onerror(None);
    result
}

pub async fn read_blob_as_data_url(bytes: &[u8], mime_type: &str) -> Result<String, String> {
    let blob = make_blob(bytes, mime_type)?;
    read_blob(&blob, ReadMode::DataUrl)
        .await?
        .as_string()
        .ok_or_else(|| "file reader returned non-string result".to_string())
}

pub async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let buffer = read_blob(file, ReadMode::ArrayBuffer).await?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

pub fn set_timeout(delay_ms: u64, task: Box<dyn FnOnce()>) -> Result<(), String> {
    let callback = Closure::once_into_js(move || task());
    let timeout = i32::try_from(delay_ms).unwrap_or(i32::MAX);
    window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), timeout)
        .map(|_| ())
        .map_err(|err| js_error("setTimeout failed", err))
}

pub fn raise_uncaught(message: String) -> Result<(), String> {
    set_timeout(
        0,
        Box::new(move || {
            wasm_bindgen::throw_str(&message);
        }),
    )
}

pub fn set_element_visible(element_id: &str, visible: bool) -> Result<(), String> {
    let element = document()?
        .get_element_by_id(element_id)
        .ok_or_else(|| format!("element `#{element_id}` not found"))?
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|_| format!("`#{element_id}` is not an HTML element"))?;
    element
        .style()
        .set_property("display", if visible { "block" } else { "none" })
        .map_err(|err| js_error("failed to set display", err))
}

fn file_input(
    document: &web_sys::Document,
    input_id: &str,
) -> Result<web_sys::HtmlInputElement, String> {
    document
        .get_element_by_id(input_id)
        .ok_or_else(|| format!("element `#{input_id}` not found"))?
        .dyn_into::<web_sys::HtmlInputElement>()
        .map_err(|_| format!("`#{input_id}` is not an input element"))
}

pub fn clear_file_input(input_id: &str) -> Result<(), String> {
    file_input(&document()?, input_id)?.set_value("");
    Ok(())
}

pub fn watch_intake_dialog(
    config: &IntakeDialogConfig,
    sink: Rc<dyn Fn(IntakeSignal)>,
) -> Result<Vec<ListenerGuard>, String> {
    let document = document()?;
    let modal = document
        .get_element_by_id(&config.modal_id)
        .ok_or_else(|| format!("element `#{}` not found", config.modal_id))?;
    let input = file_input(&document, &config.input_id)?;
    let mut guards = Vec::with_capacity(3);

    if let Some(close) = document
        .get_elements_by_class_name(&config.close_class)
        .item(0)
    {
        let sink = sink.clone();
        guards.push(listen(&close, "click", move |_| sink(IntakeSignal::Close))?);
    }

    let backdrop_sink = sink.clone();
    let backdrop = modal.clone();
    guards.push(listen(&modal, "click", move |event: web_sys::Event| {
        let on_backdrop = event
            .target()
            .is_some_and(|target| js_sys::Object::is(&target, &backdrop));
        if on_backdrop {
            backdrop_sink(IntakeSignal::Backdrop);
        }
    })?);

    let chooser = input.clone();
    guards.push(listen(&input, "change", move |_| {
        if let Some(file) = chooser.files().and_then(|files| files.get(0)) {
            sink(IntakeSignal::FileChosen(file));
        }
    })?);

    Ok(guards)
}

pub fn watch_window_keydown(
    suppress: Rc<dyn Fn(KeyStroke) -> bool>,
) -> Result<ListenerGuard, String> {
    listen(&window()?, "keydown", move |event: web_sys::Event| {
        let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
            return;
        };
        #[allow(deprecated)]
        let stroke = KeyStroke {
            key_code: event.key_code(),
            ctrl: event.ctrl_key(),
        };
        if suppress(stroke) {
            event.prevent_default();
        }
    })
}
