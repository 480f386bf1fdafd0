use super::*;

fn unsupported() -> String {
    "Browser APIs are only available when compiled for wasm32".to_string()
}

/// Placeholder for a DOM listener registration; never constructed off `wasm32`.
pub struct ListenerGuard {
    _private: (),
}

pub fn build_get_request(_url: &str) -> Result<web_sys::Request, String> {
    Err(unsupported())
}

pub async fn fetch_request(_request: &web_sys::Request) -> Result<web_sys::Response, String> {
    Err(unsupported())
}

pub async fn cache_bucket_exists(_bucket: &str) -> Result<bool, String> {
    Ok(false)
}

pub async fn cache_bucket_put_all(
    _bucket: &str,
    _entries: Vec<(String, web_sys::Response)>,
) -> Result<(), String> {
    Err(unsupported())
}

pub async fn cache_bucket_match(
    _bucket: &str,
    _url: &str,
) -> Result<Option<web_sys::Response>, String> {
    Ok(None)
}

pub async fn cache_bucket_names() -> Result<Vec<String>, String> {
    Ok(Vec::new())
}

pub async fn cache_bucket_delete(_bucket: &str) -> Result<bool, String> {
    Ok(false)
}

pub fn extend_event_lifetime(
    _event: &web_sys::ExtendableEvent,
    _work: EventWork<()>,
) -> Result<(), String> {
    Err(unsupported())
}

pub fn respond_to_fetch(
    _event: &web_sys::FetchEvent,
    _work: EventWork<web_sys::Response>,
) -> Result<(), String> {
    Err(unsupported())
}

pub async fn register_service_worker(_script_url: &str) -> Result<String, String> {
    Err(unsupported())
}

pub fn has_native_save() -> bool {
    false
}

pub fn native_save(_bytes: &[u8], _mime_type: &str, _filename: &str) -> Result<(), String> {
    Err(unsupported())
}

pub fn anchor_supports_download() -> bool {
    false
}

pub fn file_reader_available() -> bool {
    false
}

pub fn legacy_safari_quirk() -> bool {
    false
}

pub fn user_agent() -> String {
    String::new()
}

pub fn create_object_url(_bytes: &[u8], _mime_type: &str) -> Result<String, String> {
    Err(unsupported())
}

pub fn revoke_object_url(_url: &str) {}

pub fn click_download_anchor(_url: &str, _filename: &str) -> Result<(), String> {
    Err(unsupported())
}

pub fn open_window(_url: &str) -> bool {
    false
}

pub fn navigate(_url: &str) -> Result<(), String> {
    Err(unsupported())
}

pub async fn read_blob_as_data_url(_bytes: &[u8], _mime_type: &str) -> Result<String, String> {
    Err(unsupported())
}

pub fn set_timeout(_delay_ms: u64, _task: Box<dyn FnOnce()>) -> Result<(), String> {
    Err(unsupported())
}

pub fn raise_uncaught(_message: String) -> Result<(), String> {
    Err(unsupported())
}

pub fn set_element_visible(_element_id: &str, _visible: bool) -> Result<(), String> {
    Err(unsupported())
}

pub fn clear_file_input(_input_id: &str) -> Result<(), String> {
    Err(unsupported())
}

pub fn watch_intake_dialog(
    _config: &IntakeDialogConfig,
    _sink: Rc<dyn Fn(IntakeSignal)>,
) -> Result<Vec<ListenerGuard>, String> {
    Err(unsupported())
}

pub async fn read_file_bytes(_file: &web_sys::File) -> Result<Vec<u8>, String> {
    Err(unsupported())
}

pub fn watch_window_keydown(
    _suppress: Rc<dyn Fn(KeyStroke) -> bool>,
) -> Result<ListenerGuard, String> {
    Err(unsupported())
}
