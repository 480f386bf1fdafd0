//! Download shim: one "save blob as file" contract over every capability tier.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use super::{
    capability::{DataUriFlavor, SaveCapability},
    events::{ReadyState, SaveEvent, SaveEventHandlers, SaveHandler},
    handle::ObjectHandle,
    payload::{data_uri_as_attachment, SavePayload, SaveRequest},
    platform::{SavePlatform, Scheduler},
};
use crate::{
    config::DownloadConfig,
    error::{SaveError, SaveHandlerError},
};

/// Saves binary payloads as named files using the tier picked at startup.
///
/// Saves on one shim must not overlap; a second call while one is running is rejected.
pub struct DownloadShim {
    capability: SaveCapability,
    platform: Rc<dyn SavePlatform>,
    scheduler: Rc<dyn Scheduler>,
    release_delay_ms: u64,
    default_filename: String,
    handlers: RefCell<SaveEventHandlers>,
    ready_state: Cell<ReadyState>,
    in_progress: Cell<bool>,
}

struct InProgress<'a>(&'a Cell<bool>);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl DownloadShim {
    /// Creates a shim over injected platform and scheduler handles.
    pub fn new(
        capability: SaveCapability,
        platform: Rc<dyn SavePlatform>,
        scheduler: Rc<dyn Scheduler>,
        config: &DownloadConfig,
    ) -> Self {
        Self {
            capability,
            platform,
            scheduler,
            release_delay_ms: u64::from(config.release_delay_ms),
            default_filename: config.default_filename.clone(),
            handlers: RefCell::new(SaveEventHandlers::default()),
            ready_state: Cell::new(ReadyState::Init),
            in_progress: Cell::new(false),
        }
    }

    /// Returns the tier this shim runs.
    pub fn capability(&self) -> SaveCapability {
        self.capability
    }

    /// Returns the state of the most recent save.
    pub fn ready_state(&self) -> ReadyState {
        self.ready_state.get()
    }

    /// Registers `handler` for `event`, replacing any previous one.
    pub fn set_handler(
        &self,
        event: SaveEvent,
        handler: impl FnMut(SaveEvent, ReadyState) -> Result<(), String> + 'static,
    ) {
        let handler: SaveHandler = Box::new(handler);
        self.handlers.borrow_mut().set(event, Some(handler));
    }

    /// Removes the handler for `event`.
    pub fn clear_handler(&self, event: SaveEvent) {
        self.handlers.borrow_mut().set(event, None);
    }

    /// No-op: a save cannot be cancelled once handed to the browser.
    pub fn abort(&self) {}

    /// Saves `request` and resolves once the save reached [`ReadyState::Done`].
    ///
    /// The native tier delegates and returns without lifecycle events. Every other tier fires
    /// `writestart`, `progress`, `write`, `writeend` in that order. Handler errors are reported
    /// through [`Scheduler::report_error`] and never interrupt the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::SaveInProgress`] for an overlapping call and [`SaveError::Platform`]
    /// when a browser primitive fails; the latter fires `error` then `writeend`.
    pub async fn save(&self, request: SaveRequest) -> Result<(), SaveError> {
        if self.in_progress.replace(true) {
            return Err(SaveError::SaveInProgress);
        }
        let _running = InProgress(&self.in_progress);
        let filename = request.resolved_filename(&self.default_filename);

        if self.capability == SaveCapability::NativeSave {
            return self
                .platform
                .native_save(&SavePayload::raw(request), &filename)
                .map_err(SaveError::Platform);
        }

        let payload = SavePayload::normalized(request);
        self.ready_state.set(ReadyState::Init);
        let outcome = match self.capability {
            SaveCapability::AnchorDownload => self.save_with_anchor(&payload, &filename),
            SaveCapability::DataUriFallback(flavor) if uses_data_uri(flavor, &payload) => {
                self.save_through_data_uri(&payload, flavor).await
            }
            _ => self.save_by_opening(&payload),
        };

        match outcome {
            Ok(()) => {
                self.complete();
                Ok(())
            }
            Err(reason) => {
                self.dispatch(SaveEvent::Error);
                self.ready_state.set(ReadyState::Done);
                self.dispatch(SaveEvent::WriteEnd);
                Err(SaveError::Platform(reason))
            }
        }
    }

    fn save_with_anchor(&self, payload: &SavePayload, filename: &str) -> Result<(), String> {
        let handle = self.allocate(payload)?;
        self.platform.click_download_anchor(handle.url(), filename)
    }

    async fn save_through_data_uri(
        &self,
        payload: &SavePayload,
        flavor: DataUriFlavor,
    ) -> Result<(), String> {
        let uri = self.platform.read_as_data_uri(payload).await?;
        let uri = match flavor {
            DataUriFlavor::MobileChrome => uri,
            DataUriFlavor::LegacySafari => data_uri_as_attachment(&uri),
        };
        self.open_or_navigate(&uri)
    }

    fn save_by_opening(&self, payload: &SavePayload) -> Result<(), String> {
        let handle = self.allocate(payload)?;
        self.open_or_navigate(handle.url())
    }

    fn allocate(&self, payload: &SavePayload) -> Result<ObjectHandle, String> {
        ObjectHandle::allocate(
            self.platform.clone(),
            self.scheduler.clone(),
            payload,
            self.release_delay_ms,
        )
    }

    fn open_or_navigate(&self, url: &str) -> Result<(), String> {
        if self.platform.open_in_new_context(url) {
            return Ok(());
        }
        self.platform.navigate_current(url)
    }

    fn complete(&self) {
        self.ready_state.set(ReadyState::Writing);
        self.dispatch(SaveEvent::WriteStart);
        self.dispatch(SaveEvent::Progress);
        self.dispatch(SaveEvent::Write);
        self.ready_state.set(ReadyState::Done);
        self.dispatch(SaveEvent::WriteEnd);
    }

    fn dispatch(&self, event: SaveEvent) {
        let Some((mut handler, generation)) = self.handlers.borrow_mut().take(event) else {
            return;
        };
        if let Err(message) = handler(event, self.ready_state.get()) {
            self.scheduler
                .report_error(SaveHandlerError { event, message });
        }
        self.handlers
            .borrow_mut()
            .restore(event, handler, generation);
    }
}

fn uses_data_uri(flavor: DataUriFlavor, payload: &SavePayload) -> bool {
    match flavor {
        DataUriFlavor::MobileChrome => true,
        DataUriFlavor::LegacySafari => payload.is_octet_stream(),
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::download::{ManualScheduler, PlatformCall, RecordingSavePlatform, UTF8_BOM};

    struct Harness {
        shim: Rc<DownloadShim>,
        platform: RecordingSavePlatform,
        scheduler: ManualScheduler,
        fired: Rc<RefCell<Vec<(SaveEvent, ReadyState)>>>,
    }

    fn harness(capability: SaveCapability) -> Harness {
        let platform = RecordingSavePlatform::default();
        let scheduler = ManualScheduler::default();
        let shim = Rc::new(DownloadShim::new(
            capability,
            Rc::new(platform.clone()),
            Rc::new(scheduler.clone()),
            &DownloadConfig::default(),
        ));
        let fired = Rc::new(RefCell::new(Vec::new()));
        for event in SaveEvent::ALL {
            let fired = fired.clone();
            shim.set_handler(event, move |event, state| {
                fired.borrow_mut().push((event, state));
                Ok(())
            });
        }
        Harness {
            shim,
            platform,
            scheduler,
            fired,
        }
    }

    fn fired_events(harness: &Harness) -> Vec<SaveEvent> {
        harness.fired.borrow().iter().map(|(event, _)| *event).collect()
    }

    fn created_bytes(platform: &RecordingSavePlatform) -> Vec<u8> {
        platform
            .calls()
            .into_iter()
            .find_map(|call| match call {
                PlatformCall::CreateObjectUrl { bytes, .. } => Some(bytes),
                _ => None,
            })
            .expect("object url created")
    }

    #[test]
    fn direct_open_fires_completion_events_once_in_order() {
        let h = harness(SaveCapability::DirectOpen);

        block_on(h.shim.save(SaveRequest::binary(vec![7, 7], "cart.tic"))).expect("save");

        assert_eq!(fired_events(&h), SaveEvent::COMPLETION.to_vec());
        assert_eq!(h.shim.ready_state(), ReadyState::Done);
        assert_eq!(
            h.platform.calls(),
            vec![
                PlatformCall::CreateObjectUrl {
                    url: "blob:shim/1".to_string(),
                    bytes: vec![7, 7],
                },
                PlatformCall::OpenNewContext {
                    url: "blob:shim/1".to_string(),
                    opened: true,
                },
            ]
        );
    }

    #[test]
    fn done_is_set_right_before_writeend() {
        let h = harness(SaveCapability::DirectOpen);

        block_on(h.shim.save(SaveRequest::binary(vec![1], "a.bin"))).expect("save");

        assert_eq!(
            *h.fired.borrow(),
            vec![
                (SaveEvent::WriteStart, ReadyState::Writing),
                (SaveEvent::Progress, ReadyState::Writing),
                (SaveEvent::Write, ReadyState::Writing),
                (SaveEvent::WriteEnd, ReadyState::Done),
            ]
        );
    }

    #[test]
    fn blocked_popup_falls_back_to_navigation() {
        let h = harness(SaveCapability::DirectOpen);
        h.platform.block_popups(true);

        block_on(h.shim.save(SaveRequest::binary(vec![1], "a.bin"))).expect("save");

        assert_eq!(
            h.platform.calls().last(),
            Some(&PlatformCall::Navigate {
                url: "blob:shim/1".to_string(),
            })
        );
        assert_eq!(fired_events(&h), SaveEvent::COMPLETION.to_vec());
    }

    #[test]
    fn utf8_text_is_bom_prefixed_and_binary_is_not() {
        let h = harness(SaveCapability::DirectOpen);
        block_on(h.shim.save(SaveRequest::text(
            "-- title: game",
            "text/plain;charset=utf-8",
            "game.lua",
        )))
        .expect("save text");
        let stored = created_bytes(&h.platform);
        assert_eq!(&stored[..3], &UTF8_BOM);

        let h = harness(SaveCapability::DirectOpen);
        let mut request = SaveRequest::text("-- title", "text/plain;charset=utf-8", "game.lua");
        request.is_binary = true;
        block_on(h.shim.save(request)).expect("save flagged binary");
        assert_eq!(created_bytes(&h.platform), b"-- title".to_vec());
    }

    #[test]
    fn native_save_delegates_without_events_or_bom() {
        let h = harness(SaveCapability::NativeSave);

        block_on(h.shim.save(SaveRequest::text(
            "abc",
            "text/plain;charset=utf-8",
            "",
        )))
        .expect("save");

        assert_eq!(
            h.platform.calls(),
            vec![PlatformCall::NativeSave {
                filename: "download".to_string(),
                bytes: b"abc".to_vec(),
            }]
        );
        assert!(fired_events(&h).is_empty());
        assert_eq!(h.scheduler.pending_tasks(), 0);
    }

    #[test]
    fn anchor_download_clicks_with_filename() {
        let h = harness(SaveCapability::AnchorDownload);

        block_on(h.shim.save(SaveRequest::binary(vec![1, 2], "cart.tic"))).expect("save");

        assert_eq!(
            h.platform.calls()[1],
            PlatformCall::ClickAnchor {
                url: "blob:shim/1".to_string(),
                filename: "cart.tic".to_string(),
            }
        );
        assert_eq!(fired_events(&h), SaveEvent::COMPLETION.to_vec());
    }

    #[test]
    fn object_url_is_released_forty_seconds_after_creation() {
        for blocked in [false, true] {
            let h = harness(SaveCapability::DirectOpen);
            h.platform.block_popups(blocked);
            block_on(h.shim.save(SaveRequest::binary(vec![1], "a.bin"))).expect("save");

            h.scheduler.advance_by(39_999);
            assert_eq!(h.platform.live_object_urls(), vec!["blob:shim/1".to_string()]);

            h.scheduler.advance_by(1);
            assert!(h.platform.live_object_urls().is_empty());
        }
    }

    #[test]
    fn handler_errors_are_deferred_and_do_not_stop_the_save() {
        let h = harness(SaveCapability::DirectOpen);
        let fired = h.fired.clone();
        h.shim.set_handler(SaveEvent::WriteStart, move |event, state| {
            fired.borrow_mut().push((event, state));
            Err("handler exploded".to_string())
        });

        block_on(h.shim.save(SaveRequest::binary(vec![1], "a.bin"))).expect("save");

        assert_eq!(fired_events(&h), SaveEvent::COMPLETION.to_vec());
        assert!(h.scheduler.uncaught_errors().is_empty());
        h.scheduler.advance_by(0);
        assert_eq!(
            h.scheduler.uncaught_errors(),
            vec![SaveHandlerError {
                event: SaveEvent::WriteStart,
                message: "handler exploded".to_string(),
            }]
        );
    }

    #[test]
    fn mobile_chrome_saves_through_a_data_uri() {
        let h = harness(SaveCapability::DataUriFallback(DataUriFlavor::MobileChrome));

        block_on(h.shim.save(SaveRequest::binary(vec![1, 2, 3], "cart.tic"))).expect("save");

        assert_eq!(
            h.platform.calls(),
            vec![
                PlatformCall::ReadDataUri {
                    mime_type: "application/octet-stream".to_string(),
                },
                PlatformCall::OpenNewContext {
                    url: "data:application/octet-stream;base64,<3 bytes>".to_string(),
                    opened: true,
                },
            ]
        );
        assert_eq!(fired_events(&h), SaveEvent::COMPLETION.to_vec());
    }

    #[test]
    fn legacy_safari_rewrites_binary_data_uris_and_opens_text_directly() {
        let h = harness(SaveCapability::DataUriFallback(DataUriFlavor::LegacySafari));
        h.platform.block_popups(true);
        block_on(h.shim.save(SaveRequest::binary(vec![1], "cart.tic"))).expect("save binary");
        assert_eq!(
            h.platform.calls().last(),
            Some(&PlatformCall::Navigate {
                url: "data:attachment/file;base64,<1 bytes>".to_string(),
            })
        );

        let h = harness(SaveCapability::DataUriFallback(DataUriFlavor::LegacySafari));
        block_on(h.shim.save(SaveRequest::text("x", "text/plain", "x.txt"))).expect("save text");
        assert!(matches!(
            h.platform.calls()[0],
            PlatformCall::CreateObjectUrl { .. }
        ));
    }

    #[test]
    fn platform_failure_fires_error_then_writeend() {
        let h = harness(SaveCapability::DirectOpen);
        h.platform.refuse_object_urls(true);

        let err = block_on(h.shim.save(SaveRequest::binary(vec![1], "a.bin"))).expect_err("save");

        assert_eq!(
            err,
            SaveError::Platform("object URL allocation refused".to_string())
        );
        assert_eq!(fired_events(&h), vec![SaveEvent::Error, SaveEvent::WriteEnd]);
        assert_eq!(h.shim.ready_state(), ReadyState::Done);
    }

    #[test]
    fn overlapping_saves_are_rejected_until_the_first_finishes() {
        let h = harness(SaveCapability::DataUriFallback(DataUriFlavor::MobileChrome));
        h.platform.hold_reads(true);

        block_on(async {
            let first = h.shim.save(SaveRequest::binary(vec![1], "a.bin"));
            futures::pin_mut!(first);
            assert!(futures::poll!(first.as_mut()).is_pending());

            let second = h.shim.save(SaveRequest::binary(vec![2], "b.bin")).await;
            assert_eq!(second, Err(SaveError::SaveInProgress));

            h.platform.release_reads();
            first.await.expect("first save");
        });

        h.platform.hold_reads(false);
        block_on(h.shim.save(SaveRequest::binary(vec![3], "c.bin"))).expect("third save");
        assert_eq!(
            fired_events(&h),
            [SaveEvent::COMPLETION, SaveEvent::COMPLETION].concat()
        );
    }

    #[test]
    fn handler_clearing_itself_is_not_called_again() {
        let h = harness(SaveCapability::DirectOpen);
        let calls = Rc::new(Cell::new(0));
        let shim = Rc::downgrade(&h.shim);
        let counted = calls.clone();
        h.shim.set_handler(SaveEvent::WriteEnd, move |_, _| {
            counted.set(counted.get() + 1);
            if let Some(shim) = shim.upgrade() {
                shim.clear_handler(SaveEvent::WriteEnd);
            }
            Ok(())
        });

        block_on(h.shim.save(SaveRequest::binary(vec![1], "a.bin"))).expect("first save");
        block_on(h.shim.save(SaveRequest::binary(vec![2], "b.bin"))).expect("second save");

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn abort_is_a_no_op() {
        let h = harness(SaveCapability::DirectOpen);
        h.shim.abort();
        block_on(h.shim.save(SaveRequest::binary(vec![1], "a.bin"))).expect("save");
        assert!(!fired_events(&h).contains(&SaveEvent::Abort));
    }
}
