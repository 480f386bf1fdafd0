//! First-come, first-served saves over one [`DownloadShim`].

use std::rc::Rc;

use futures::lock::Mutex;

use super::{
    events::{SaveEvent, SaveHandler},
    payload::SaveRequest,
    shim::DownloadShim,
};
use crate::error::SaveError;

/// Handlers registered for the duration of one queued save.
pub type SaveHandlers = Vec<(SaveEvent, SaveHandler)>;

/// Runs saves one after another so callers never see [`SaveError::SaveInProgress`].
///
/// Each queued save brings its own handlers. They are registered when its turn starts and cleared
/// once it reaches [`ReadyState::Done`](super::ReadyState::Done).
pub struct SaveQueue {
    shim: Rc<DownloadShim>,
    turn: Mutex<()>,
}

impl SaveQueue {
    /// Wraps `shim`.
    pub fn new(shim: Rc<DownloadShim>) -> Self {
        Self {
            shim,
            turn: Mutex::new(()),
        }
    }

    /// Returns the wrapped shim.
    pub fn shim(&self) -> &Rc<DownloadShim> {
        &self.shim
    }

    /// Waits for every earlier save, then saves `request` with `handlers` in place.
    ///
    /// # Errors
    ///
    /// Returns the [`SaveError`] of this save; earlier failures do not affect it.
    pub async fn save(
        &self,
        request: SaveRequest,
        handlers: SaveHandlers,
    ) -> Result<(), SaveError> {
        let _turn = self.turn.lock().await;
        let events: Vec<SaveEvent> = handlers.iter().map(|(event, _)| *event).collect();
        for (event, handler) in handlers {
            self.shim.set_handler(event, handler);
        }
        let result = self.shim.save(request).await;
        for event in events {
            self.shim.clear_handler(event);
        }
        result
    }
}
