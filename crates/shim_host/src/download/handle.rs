//! Scoped object URL handle.

use std::rc::Rc;

use super::{
    payload::SavePayload,
    platform::{SavePlatform, Scheduler},
};
use crate::time::remaining_delay_ms;

/// Object URL that schedules its own release when dropped.
///
/// The release runs `release_delay_ms` after allocation, or at drop time if that is later, so a
/// browsing context opened with the URL can still load it after the save returns.
pub struct ObjectHandle {
    url: String,
    created_at_ms: u64,
    release_delay_ms: u64,
    platform: Rc<dyn SavePlatform>,
    scheduler: Rc<dyn Scheduler>,
}

impl ObjectHandle {
    /// Allocates an object URL for `payload`.
    ///
    /// # Errors
    ///
    /// Returns the platform error when the URL cannot be allocated.
    pub fn allocate(
        platform: Rc<dyn SavePlatform>,
        scheduler: Rc<dyn Scheduler>,
        payload: &SavePayload,
        release_delay_ms: u64,
    ) -> Result<Self, String> {
        let url = platform.create_object_url(payload)?;
        Ok(Self {
            url,
            created_at_ms: scheduler.now_ms(),
            release_delay_ms,
            platform,
            scheduler,
        })
    }

    /// Returns the object URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectHandle {
    fn drop(&mut self) {
        let url = std::mem::take(&mut self.url);
        let platform = self.platform.clone();
        let delay = remaining_delay_ms(
            self.created_at_ms,
            self.release_delay_ms,
            self.scheduler.now_ms(),
        );
        self.scheduler
            .schedule(delay, Box::new(move || platform.revoke_object_url(&url)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{ManualScheduler, PlatformCall, RecordingSavePlatform};

    fn payload() -> SavePayload {
        SavePayload {
            bytes: vec![1, 2, 3],
            mime_type: "application/octet-stream".to_string(),
        }
    }

    #[test]
    fn release_waits_for_the_full_delay_after_allocation() {
        let platform = RecordingSavePlatform::default();
        let scheduler = ManualScheduler::default();
        let handle = ObjectHandle::allocate(
            Rc::new(platform.clone()),
            Rc::new(scheduler.clone()),
            &payload(),
            40_000,
        )
        .expect("allocate");
        let url = handle.url().to_string();

        scheduler.advance_by(15_000);
        drop(handle);
        scheduler.advance_by(24_999);
        assert_eq!(platform.live_object_urls(), vec![url.clone()]);

        scheduler.advance_by(1);
        assert!(platform.live_object_urls().is_empty());
        assert_eq!(
            platform.calls().last(),
            Some(&PlatformCall::RevokeObjectUrl { url })
        );
    }

    #[test]
    fn late_drop_releases_immediately_once_due() {
        let platform = RecordingSavePlatform::default();
        let scheduler = ManualScheduler::default();
        let handle = ObjectHandle::allocate(
            Rc::new(platform.clone()),
            Rc::new(scheduler.clone()),
            &payload(),
            40_000,
        )
        .expect("allocate");

        scheduler.advance_by(50_000);
        drop(handle);
        assert_eq!(platform.live_object_urls().len(), 1);
        scheduler.advance_by(0);
        assert!(platform.live_object_urls().is_empty());
    }
}
