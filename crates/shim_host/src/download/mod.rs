//! Download domain: capability tiers, payload normalization, lifecycle events, and the shim.

mod capability;
mod events;
mod handle;
mod payload;
mod platform;
mod queue;
mod shim;

pub use capability::{is_mobile_chrome, DataUriFlavor, PlatformProbe, SaveCapability};
pub use events::{ReadyState, SaveEvent, SaveHandler};
pub use handle::ObjectHandle;
pub use payload::{
    data_uri_as_attachment, declares_utf8_text, SavePayload, SaveRequest, OCTET_STREAM,
    UTF8_BOM,
};
pub use platform::{
    ManualScheduler, PlatformCall, RecordingSavePlatform, SaveFuture, SavePlatform, Scheduler,
};
pub use queue::{SaveHandlers, SaveQueue};
pub use shim::DownloadShim;
