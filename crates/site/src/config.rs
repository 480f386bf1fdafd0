//! Build-time shim configuration embedded into the bundle.

use leptos::logging::warn;
use shim_host::ShimConfig;

const EMBEDDED_CONFIG: &str = include_str!("../config/shim.json");

/// Parses the embedded `shim.json`, falling back to the shipped defaults when it is rejected.
pub fn load_config() -> ShimConfig {
    match ShimConfig::from_json(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(err) => {
            warn!("[config] embedded shim.json rejected, using defaults: {err}");
            ShimConfig::default()
        }
    }
}
