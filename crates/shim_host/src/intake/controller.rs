//! File intake controller: one modal session, exactly one outcome.
//!
//! A session opens on [`IntakeController::request_file`] and ends on either a cancel trigger or a
//! completed read, whichever comes first. The callback always runs after the session has been
//! detached, so it may open the next session itself.

use std::{
    cell::{Cell, RefCell},
    future::Future,
};

use super::dialog::IntakeDialog;
use crate::error::IntakeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Modal visibility.
pub enum Visibility {
    /// The dialog is closed.
    Hidden,
    /// The dialog is shown and waiting for the user.
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// User action that dismisses the dialog without a file.
pub enum CancelTrigger {
    /// The explicit close control.
    CloseControl,
    /// A click on the backdrop outside the dialog body.
    Backdrop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable bytes of a fully read file.
pub struct FileBuffer(Vec<u8>);

impl FileBuffer {
    /// Wraps read bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrows the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Takes ownership of the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the file was empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Terminal outcome of one intake session.
pub enum IntakeOutcome {
    /// The user picked a file and it was read completely.
    Selected {
        /// Name of the selected file.
        filename: String,
        /// File contents.
        buffer: FileBuffer,
    },
    /// The user dismissed the dialog.
    Cancelled,
}

impl IntakeOutcome {
    /// Splits into the `(filename, buffer)` pair handed to the hosted application, both `None`
    /// on cancel.
    pub fn into_parts(self) -> (Option<String>, Option<FileBuffer>) {
        match self {
            Self::Selected { filename, buffer } => (Some(filename), Some(buffer)),
            Self::Cancelled => (None, None),
        }
    }
}

/// Completion callback, invoked exactly once per session.
pub type IntakeCallback = Box<dyn FnOnce(IntakeOutcome)>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ticket for the single in-flight read of a session.
pub struct PendingRead {
    session: u64,
    filename: String,
}

impl PendingRead {
    /// Name of the file being read.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

struct OpenSession {
    id: u64,
    callback: IntakeCallback,
    reading: bool,
}

/// Drives the intake dialog through one session at a time.
pub struct IntakeController<D> {
    dialog: D,
    session: RefCell<Option<OpenSession>>,
    next_session: Cell<u64>,
    visibility: Cell<Visibility>,
}

impl<D: IntakeDialog> IntakeController<D> {
    /// Creates a controller with the dialog hidden.
    pub fn new(dialog: D) -> Self {
        Self {
            dialog,
            session: RefCell::new(None),
            next_session: Cell::new(0),
            visibility: Cell::new(Visibility::Hidden),
        }
    }

    /// Returns the dialog handle.
    pub fn dialog(&self) -> &D {
        &self.dialog
    }

    /// Returns the modal visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility.get()
    }

    /// Returns whether a session is open.
    pub fn is_open(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Opens the dialog and parks `callback` until the session ends.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::SessionOpen`] when a session is already open; `callback` is
    /// dropped without being called.
    pub fn request_file(&self, callback: IntakeCallback) -> Result<(), IntakeError> {
        let mut session = self.session.borrow_mut();
        if session.is_some() {
            return Err(IntakeError::SessionOpen);
        }
        let id = self.next_session.get() + 1;
        self.next_session.set(id);
        *session = Some(OpenSession {
            id,
            callback,
            reading: false,
        });
        drop(session);
        self.show(true);
        Ok(())
    }

    /// Ends the open session as cancelled. Returns `false` when nothing was open.
    pub fn cancel(&self, _trigger: CancelTrigger) -> bool {
        let Some(session) = self.session.borrow_mut().take() else {
            return false;
        };
        self.show(false);
        (session.callback)(IntakeOutcome::Cancelled);
        true
    }

    /// Claims the session's read slot for `filename`.
    ///
    /// Returns `None` when no session is open, a read is already running, or the selection is
    /// empty; the caller must not read the file in that case.
    pub fn begin_read(&self, filename: &str) -> Option<PendingRead> {
        if filename.is_empty() {
            return None;
        }
        let mut session = self.session.borrow_mut();
        let session = session.as_mut()?;
        if session.reading {
            return None;
        }
        session.reading = true;
        Some(PendingRead {
            session: session.id,
            filename: filename.to_string(),
        })
    }

    /// Finishes the read claimed by `pending`.
    ///
    /// On success the callback receives the file, then the selection control is cleared and
    /// the dialog hidden. Returns `Ok(false)` when the session already ended.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Read`] when `result` is an error. The session stays open so the user
    /// can pick another file.
    pub fn complete_read(
        &self,
        pending: PendingRead,
        result: Result<Vec<u8>, String>,
    ) -> Result<bool, IntakeError> {
        let session = {
            let mut slot = self.session.borrow_mut();
            match slot.as_mut() {
                Some(open) if open.id == pending.session => {}
                _ => return Ok(false),
            }
            match result {
                Ok(bytes) => slot.take().map(|session| (session, bytes)),
                Err(reason) => {
                    if let Some(open) = slot.as_mut() {
                        open.reading = false;
                    }
                    return Err(IntakeError::Read {
                        filename: pending.filename,
                        reason,
                    });
                }
            }
        };
        let Some((session, bytes)) = session else {
            return Ok(false);
        };

        (session.callback)(IntakeOutcome::Selected {
            filename: pending.filename,
            buffer: FileBuffer::new(bytes),
        });
        if !self.is_open() {
            self.dialog.clear_selection();
            self.show(false);
        }
        Ok(true)
    }

    /// Claims the read slot, awaits the future built by `read`, and completes the session.
    ///
    /// `read` is only invoked when a read may start.
    ///
    /// # Errors
    ///
    /// Propagates [`IntakeController::complete_read`] errors.
    pub async fn select_file<F, Fut>(&self, filename: &str, read: F) -> Result<bool, IntakeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, String>>,
    {
        let Some(pending) = self.begin_read(filename) else {
            return Ok(false);
        };
        let result = read().await;
        self.complete_read(pending, result)
    }

    fn show(&self, visible: bool) {
        self.visibility.set(if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        });
        self.dialog.set_visible(visible);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::intake::MemoryIntakeDialog;

    type Outcomes = Rc<RefCell<Vec<(Option<String>, Option<Vec<u8>>)>>>;

    fn recorder() -> (Outcomes, impl Fn() -> IntakeCallback) {
        let outcomes: Outcomes = Rc::new(RefCell::new(Vec::new()));
        let sink = outcomes.clone();
        let make = move || -> IntakeCallback {
            let sink = sink.clone();
            Box::new(move |outcome: IntakeOutcome| {
                let (name, buffer) = outcome.into_parts();
                sink.borrow_mut()
                    .push((name, buffer.map(FileBuffer::into_bytes)));
            })
        };
        (outcomes, make)
    }

    #[test]
    fn selecting_a_file_delivers_it_once_then_clears_and_hides() {
        let dialog = MemoryIntakeDialog::default();
        let controller = IntakeController::new(dialog.clone());
        let (outcomes, callback) = recorder();
        let reads = Cell::new(0);

        controller.request_file(callback()).expect("open");
        assert_eq!(controller.visibility(), Visibility::Visible);
        assert!(dialog.is_visible());

        assert!(dialog.choose("rom.bin"));
        let delivered = block_on(controller.select_file("rom.bin", || {
            reads.set(reads.get() + 1);
            async { Ok(vec![0x01, 0x02, 0x03]) }
        }))
        .expect("select");

        assert!(delivered);
        assert_eq!(
            *outcomes.borrow(),
            vec![(Some("rom.bin".to_string()), Some(vec![0x01, 0x02, 0x03]))]
        );
        assert_eq!(controller.visibility(), Visibility::Hidden);
        assert!(!dialog.is_visible());
        assert_eq!(dialog.selection(), None);

        controller.request_file(callback()).expect("reopen");
        assert!(dialog.choose("rom.bin"), "cleared input must fire change again");
        block_on(controller.select_file("rom.bin", || {
            reads.set(reads.get() + 1);
            async { Ok(vec![0x01, 0x02, 0x03]) }
        }))
        .expect("select again");
        assert_eq!(reads.get(), 2);
        assert_eq!(outcomes.borrow().len(), 2);
    }

    #[test]
    fn backdrop_click_cancels_without_reading() {
        let dialog = MemoryIntakeDialog::default();
        let controller = IntakeController::new(dialog.clone());
        let (outcomes, callback) = recorder();

        controller.request_file(callback()).expect("open");
        assert!(controller.cancel(CancelTrigger::Backdrop));

        assert_eq!(*outcomes.borrow(), vec![(None, None)]);
        assert_eq!(controller.visibility(), Visibility::Hidden);
        assert!(!dialog.is_visible());

        let read_started = Cell::new(false);
        let delivered = block_on(controller.select_file("rom.bin", || {
            read_started.set(true);
            async { Ok(vec![1]) }
        }))
        .expect("select after cancel");
        assert!(!delivered);
        assert!(!read_started.get());
        assert_eq!(outcomes.borrow().len(), 1);
    }

    #[test]
    fn cancel_triggers_are_ignored_once_the_session_ended() {
        let controller = IntakeController::new(MemoryIntakeDialog::default());
        let (outcomes, callback) = recorder();

        controller.request_file(callback()).expect("open");
        assert!(controller.cancel(CancelTrigger::CloseControl));
        assert!(!controller.cancel(CancelTrigger::Backdrop));
        assert!(!controller.cancel(CancelTrigger::CloseControl));

        assert_eq!(outcomes.borrow().len(), 1);
    }

    #[test]
    fn only_one_session_may_be_open() {
        let controller = IntakeController::new(MemoryIntakeDialog::default());
        let (outcomes, callback) = recorder();

        controller.request_file(callback()).expect("open");
        assert_eq!(
            controller.request_file(callback()),
            Err(IntakeError::SessionOpen)
        );
        controller.cancel(CancelTrigger::CloseControl);

        assert_eq!(outcomes.borrow().len(), 1);
    }

    #[test]
    fn only_one_read_may_be_in_flight() {
        let controller = IntakeController::new(MemoryIntakeDialog::default());
        let (outcomes, callback) = recorder();
        controller.request_file(callback()).expect("open");

        let first = controller.begin_read("a.tic").expect("first read");
        assert_eq!(controller.begin_read("b.tic"), None);
        assert_eq!(controller.begin_read(""), None);

        assert_eq!(controller.complete_read(first, Ok(vec![9])), Ok(true));
        assert_eq!(
            *outcomes.borrow(),
            vec![(Some("a.tic".to_string()), Some(vec![9]))]
        );
    }

    #[test]
    fn cancel_during_read_wins_and_late_completion_is_dropped() {
        let dialog = MemoryIntakeDialog::default();
        let controller = IntakeController::new(dialog.clone());
        let (outcomes, callback) = recorder();
        controller.request_file(callback()).expect("open");

        let pending = controller.begin_read("slow.tic").expect("read");
        controller.cancel(CancelTrigger::Backdrop);
        controller.request_file(callback()).expect("next session");

        assert_eq!(controller.complete_read(pending, Ok(vec![1, 2])), Ok(false));
        assert_eq!(*outcomes.borrow(), vec![(None, None)]);
        assert!(controller.is_open());
        assert!(dialog.is_visible());
    }

    #[test]
    fn read_failure_keeps_the_session_open() {
        let controller = IntakeController::new(MemoryIntakeDialog::default());
        let (outcomes, callback) = recorder();
        controller.request_file(callback()).expect("open");

        let err = block_on(controller.select_file("bad.tic", || async {
            Err("NotReadableError".to_string())
        }))
        .expect_err("read fails");

        assert_eq!(
            err,
            IntakeError::Read {
                filename: "bad.tic".to_string(),
                reason: "NotReadableError".to_string(),
            }
        );
        assert!(controller.is_open());
        assert!(outcomes.borrow().is_empty());

        block_on(controller.select_file("good.tic", || async { Ok(vec![4]) })).expect("retry");
        assert_eq!(
            *outcomes.borrow(),
            vec![(Some("good.tic".to_string()), Some(vec![4]))]
        );
    }

    #[test]
    fn callback_may_open_the_next_session() {
        let dialog = MemoryIntakeDialog::default();
        let controller = Rc::new(IntakeController::new(dialog.clone()));
        let reopened = Rc::new(Cell::new(false));
        let inner = controller.clone();
        let flag = reopened.clone();

        controller
            .request_file(Box::new(move |_| {
                inner
                    .request_file(Box::new(|_| {}))
                    .expect("reopen from callback");
                flag.set(true);
            }))
            .expect("open");
        block_on(controller.select_file("a.tic", || async { Ok(vec![1]) })).expect("select");

        assert!(reopened.get());
        assert!(controller.is_open());
        assert_eq!(controller.visibility(), Visibility::Visible);
        assert!(dialog.is_visible());
        assert_eq!(dialog.clear_count(), 0);
    }
}
