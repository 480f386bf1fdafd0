//! Build-time shim configuration.
//!
//! Every section has defaults matching the shipped web build, so an empty JSON object is a valid
//! configuration. Browser entry points embed a JSON file and parse it with [`ShimConfig::from_json`].

use serde::{Deserialize, Serialize};

use crate::{cache::AssetManifest, keyboard::KeyFilterPolicy};

/// Cache bucket name used by the shipped web build.
pub const DEFAULT_CACHE_VERSION: &str = "tic80-v1";

/// Assets pre-cached by the shipped web build, in install order.
pub const DEFAULT_ASSET_PATHS: [&str; 9] = [
    "/",
    "/index.html",
    "/tic80.js",
    "/tic80.wasm",
    "/tic80-180.png",
    "/tic80-192.png",
    "/tic80-512.png",
    "/serviceworker.js",
    "/tic80.webmanifest",
];

/// Delay before an object URL created by a save is revoked.
pub const DEFAULT_RELEASE_DELAY_MS: u32 = 40_000;

/// Filename used when a save request carries none.
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "download";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// What to do with buckets left behind by previous cache versions.
pub enum StaleBucketPolicy {
    /// Keep every bucket. Storage grows across version bumps.
    #[default]
    Retain,
    /// Delete every bucket other than the current version on activation.
    Evict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Offline cache controller settings.
pub struct OfflineCacheConfig {
    /// Version string naming the active cache bucket.
    pub version: String,
    /// Assets fetched into the bucket at install time.
    pub manifest: AssetManifest,
    /// Cleanup policy applied on activation.
    pub stale_buckets: StaleBucketPolicy,
}

impl Default for OfflineCacheConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CACHE_VERSION.to_string(),
            manifest: AssetManifest::from_paths(DEFAULT_ASSET_PATHS),
            stale_buckets: StaleBucketPolicy::Retain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Download shim settings.
pub struct DownloadConfig {
    /// Milliseconds an object URL stays valid after creation.
    pub release_delay_ms: u32,
    /// Filename used when a save request has an empty name.
    pub default_filename: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            release_delay_ms: DEFAULT_RELEASE_DELAY_MS,
            default_filename: DEFAULT_DOWNLOAD_FILENAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// DOM hooks for the file intake dialog.
pub struct IntakeDialogConfig {
    /// Element id of the modal backdrop.
    pub modal_id: String,
    /// Class name of the close control; the first match is used.
    pub close_class: String,
    /// Element id of the file input.
    pub input_id: String,
}

impl Default for IntakeDialogConfig {
    fn default() -> Self {
        Self {
            modal_id: "add-modal".to_string(),
            close_class: "close".to_string(),
            input_id: "upload-input".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Complete shim configuration.
pub struct ShimConfig {
    /// Service-worker cache settings.
    pub offline_cache: OfflineCacheConfig,
    /// Save/download settings.
    pub downloads: DownloadConfig,
    /// File intake dialog hooks.
    pub intake: IntakeDialogConfig,
    /// Suppressed keyboard shortcuts.
    pub keyboard: KeyFilterPolicy,
}

impl ShimConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not valid JSON for this schema or fails
    /// [`ShimConfig::validate`].
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty cache version, an empty manifest, or a manifest entry that
    /// is not root-relative.
    pub fn validate(&self) -> Result<(), String> {
        if self.offline_cache.version.trim().is_empty() {
            return Err("offline cache version must not be empty".to_string());
        }
        if self.offline_cache.manifest.is_empty() {
            return Err("asset manifest must list at least one path".to_string());
        }
        if let Some(path) = self
            .offline_cache
            .manifest
            .iter()
            .find(|path| !path.starts_with('/'))
        {
            return Err(format!("asset manifest entry is not root-relative: {path}"));
        }
        Ok(())
    }
}
