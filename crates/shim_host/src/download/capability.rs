//! Capability tier selection for the download shim.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Snapshot of save-related browser features, taken once at startup.
pub struct PlatformProbe {
    /// `navigator.msSaveOrOpenBlob` (or an equivalent native save) is present.
    pub native_save: bool,
    /// Anchor elements support the `download` attribute.
    pub anchor_download: bool,
    /// `FileReader` is available for data-URI conversion.
    pub file_reader: bool,
    /// Legacy Safari quirk: `HTMLElement` stringifies as a constructor object.
    pub legacy_safari: bool,
    /// Raw `navigator.userAgent`.
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Browser family that needs payloads routed through a data URI.
pub enum DataUriFlavor {
    /// Chrome on iOS cannot open `blob:` URIs from another context.
    MobileChrome,
    /// Old Safari only mishandles `application/octet-stream` blobs.
    LegacySafari,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Closed set of save strategies the shim can run.
pub enum SaveCapability {
    /// Hand the blob to the platform's native save-or-open prompt.
    NativeSave,
    /// Click a synthetic anchor carrying a `download` hint.
    AnchorDownload,
    /// Read the blob back into a data URI and open that.
    DataUriFallback(DataUriFlavor),
    /// Open the object URL directly.
    DirectOpen,
}

impl SaveCapability {
    /// Picks the strategy for a probed platform, highest-fidelity tier first.
    pub fn select(probe: &PlatformProbe) -> Self {
        if probe.native_save {
            return Self::NativeSave;
        }
        if probe.anchor_download {
            return Self::AnchorDownload;
        }
        if probe.file_reader {
            if is_mobile_chrome(&probe.user_agent) {
                return Self::DataUriFallback(DataUriFlavor::MobileChrome);
            }
            if probe.legacy_safari {
                return Self::DataUriFallback(DataUriFlavor::LegacySafari);
            }
        }
        Self::DirectOpen
    }

    /// Returns a stable token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NativeSave => "native-save",
            Self::AnchorDownload => "anchor-download",
            Self::DataUriFallback(DataUriFlavor::MobileChrome) => "data-uri-mobile-chrome",
            Self::DataUriFallback(DataUriFlavor::LegacySafari) => "data-uri-legacy-safari",
            Self::DirectOpen => "direct-open",
        }
    }
}

/// Returns whether `user_agent` identifies Chrome on iOS (`CriOS/<digits>`).
pub fn is_mobile_chrome(user_agent: &str) -> bool {
    user_agent.match_indices("CriOS/").any(|(at, marker)| {
        user_agent[at + marker.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}
