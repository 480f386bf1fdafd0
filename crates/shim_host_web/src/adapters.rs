//! Concrete adapter factories for page and service-worker wiring.

use std::rc::Rc;

use leptos::logging::log;
use shim_host::{
    DownloadConfig, DownloadShim, KeyFilterPolicy, OfflineCacheConfig, OfflineCacheController,
    PlatformProbe, SaveCapability, SavePlatform, SaveQueue, Scheduler, ShimConfig,
};

use crate::{
    download::{probe_platform, CapabilityReport, WebSavePlatform, WebScheduler},
    intake::{intake_controller, WebIntakeController},
    service_worker::WebOfflineCache,
    WebCacheStore, WebNetwork,
};

/// Page-side shim services built from one configuration.
pub struct PageServices {
    /// Save queue over the download shim bound to the probed tier.
    pub download: Rc<SaveQueue>,
    /// File intake controller bound to the page's dialog.
    pub intake: Rc<WebIntakeController>,
    /// Keyboard suppression policy.
    pub keyboard: KeyFilterPolicy,
    /// Probe results and the tier they selected.
    pub capability: CapabilityReport,
}

/// Returns the browser save platform as a shared trait object.
pub fn save_platform() -> Rc<dyn SavePlatform> {
    Rc::new(WebSavePlatform)
}

/// Returns the browser scheduler as a shared trait object.
pub fn scheduler() -> Rc<dyn Scheduler> {
    Rc::new(WebScheduler)
}

/// Builds a download shim for an already probed platform.
pub fn download_shim(config: &DownloadConfig, probe: &PlatformProbe) -> DownloadShim {
    DownloadShim::new(
        SaveCapability::select(probe),
        save_platform(),
        scheduler(),
        config,
    )
}

/// Builds the service worker's offline cache controller.
pub fn offline_cache(config: &OfflineCacheConfig) -> WebOfflineCache {
    OfflineCacheController::new(WebCacheStore, WebNetwork, config)
}

/// Probes the page once and builds every page-side service.
pub fn build_page_services(config: &ShimConfig) -> PageServices {
    let probe = probe_platform();
    let download = Rc::new(SaveQueue::new(Rc::new(download_shim(
        &config.downloads,
        &probe,
    ))));
    let capability = CapabilityReport::new(probe);
    log!("[save] using {} tier", capability.capability);
    PageServices {
        download,
        intake: intake_controller(&config.intake),
        keyboard: config.keyboard.clone(),
        capability,
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use shim_host::{SaveError, SaveRequest};

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_page_services_fall_back_to_direct_open() {
        let services = build_page_services(&ShimConfig::default());

        assert_eq!(services.download.shim().capability(), SaveCapability::DirectOpen);
        assert_eq!(services.capability.capability, "direct-open");
        assert_eq!(services.keyboard, KeyFilterPolicy::default());
        assert!(!services.intake.is_open());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_queued_saves_each_report_the_platform_error() {
        let services = build_page_services(&ShimConfig::default());

        for filename in ["a.bin", "b.bin"] {
            let err = block_on(
                services
                    .download
                    .save(SaveRequest::binary(vec![1], filename), Vec::new()),
            )
            .expect_err("save needs a browser");
            assert_eq!(
                err,
                SaveError::Platform(
                    "Browser APIs are only available when compiled for wasm32".to_string()
                )
            );
        }
    }

    #[test]
    fn offline_cache_uses_the_configured_version() {
        let config = OfflineCacheConfig {
            version: "tic80-v2".to_string(),
            ..OfflineCacheConfig::default()
        };
        let cache = offline_cache(&config);

        assert_eq!(cache.version(), "tic80-v2");
        assert_eq!(cache.manifest(), &config.manifest);
    }
}
