//! Binary entrypoint for the browser-hosted `site` bundle.

#[cfg(all(target_arch = "wasm32", feature = "csr"))]
fn main() {
    if let Err(err) = site::boot_page() {
        leptos::logging::error!("page boot failed: {err:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!(
        "This binary is intended for the browser/WASM workflow. Build `site` for wasm32 with the `csr` feature and load it from the page and service worker scripts."
    );
}
