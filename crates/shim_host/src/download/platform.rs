//! Browser-facing seams used by the download shim, plus recording adapters for tests.

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use futures::channel::oneshot;

use super::payload::SavePayload;
use crate::error::SaveHandlerError;

/// Object-safe boxed future used by [`SavePlatform`] async methods.
pub type SaveFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Browser primitives the download shim drives.
pub trait SavePlatform {
    /// Hands the payload to the native save-or-open prompt.
    fn native_save(&self, payload: &SavePayload, filename: &str) -> Result<(), String>;

    /// Allocates an object URL for the payload.
    fn create_object_url(&self, payload: &SavePayload) -> Result<String, String>;

    /// Releases an object URL.
    fn revoke_object_url(&self, url: &str);

    /// Points a download anchor at `url` with `filename` and dispatches a synthetic click.
    fn click_download_anchor(&self, url: &str, filename: &str) -> Result<(), String>;

    /// Opens `url` in a new browsing context. Returns `false` when the popup was blocked.
    fn open_in_new_context(&self, url: &str) -> bool;

    /// Navigates the current browsing context to `url`.
    fn navigate_current(&self, url: &str) -> Result<(), String>;

    /// Reads the payload back as a `data:` URI.
    fn read_as_data_uri<'a>(&'a self, payload: &'a SavePayload)
        -> SaveFuture<'a, Result<String, String>>;
}

/// Timer and error channel used for deferred work.
pub trait Scheduler {
    /// Current time in milliseconds on the scheduler's clock.
    fn now_ms(&self) -> u64;

    /// Runs `task` once after `delay_ms`.
    fn schedule(&self, delay_ms: u64, task: Box<dyn FnOnce()>);

    /// Surfaces a handler error on the platform's uncaught-error channel from a zero-delay task,
    /// never synchronously.
    fn report_error(&self, error: SaveHandlerError);
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One primitive invoked on a [`RecordingSavePlatform`].
pub enum PlatformCall {
    /// [`SavePlatform::native_save`].
    NativeSave {
        /// Offered filename.
        filename: String,
        /// Payload bytes.
        bytes: Vec<u8>,
    },
    /// [`SavePlatform::create_object_url`].
    CreateObjectUrl {
        /// Allocated URL.
        url: String,
        /// Payload bytes.
        bytes: Vec<u8>,
    },
    /// [`SavePlatform::revoke_object_url`].
    RevokeObjectUrl {
        /// Released URL.
        url: String,
    },
    /// [`SavePlatform::click_download_anchor`].
    ClickAnchor {
        /// Anchor href.
        url: String,
        /// Anchor download name.
        filename: String,
    },
    /// [`SavePlatform::open_in_new_context`].
    OpenNewContext {
        /// Opened URL.
        url: String,
        /// Whether the context opened.
        opened: bool,
    },
    /// [`SavePlatform::navigate_current`].
    Navigate {
        /// Target URL.
        url: String,
    },
    /// [`SavePlatform::read_as_data_uri`].
    ReadDataUri {
        /// Payload MIME type.
        mime_type: String,
    },
}

#[derive(Debug, Clone, Default)]
/// Save platform fake that records every primitive call.
pub struct RecordingSavePlatform {
    calls: Rc<RefCell<Vec<PlatformCall>>>,
    next_url: Rc<Cell<u32>>,
    popups_blocked: Rc<Cell<bool>>,
    refuse_object_urls: Rc<Cell<bool>>,
    hold_reads: Rc<Cell<bool>>,
    held_reads: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
}

impl RecordingSavePlatform {
    /// Makes `open_in_new_context` report a blocked popup.
    pub fn block_popups(&self, blocked: bool) {
        self.popups_blocked.set(blocked);
    }

    /// Makes `create_object_url` fail.
    pub fn refuse_object_urls(&self, refuse: bool) {
        self.refuse_object_urls.set(refuse);
    }

    /// Keeps data-URI reads pending until [`Self::release_reads`].
    pub fn hold_reads(&self, hold: bool) {
        self.hold_reads.set(hold);
    }

    /// Completes every held data-URI read.
    pub fn release_reads(&self) {
        for sender in self.held_reads.borrow_mut().drain(..) {
            let _ = sender.send(());
        }
    }

    /// Returns the recorded calls in order.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.borrow().clone()
    }

    /// Returns object URLs that were allocated but not yet revoked.
    pub fn live_object_urls(&self) -> Vec<String> {
        let calls = self.calls.borrow();
        calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::CreateObjectUrl { url, .. } => Some(url.clone()),
                _ => None,
            })
            .filter(|url| {
                !calls.iter().any(
                    |call| matches!(call, PlatformCall::RevokeObjectUrl { url: revoked } if revoked == url),
                )
            })
            .collect()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl SavePlatform for RecordingSavePlatform {
    fn native_save(&self, payload: &SavePayload, filename: &str) -> Result<(), String> {
        self.record(PlatformCall::NativeSave {
            filename: filename.to_string(),
            bytes: payload.bytes.clone(),
        });
        Ok(())
    }

    fn create_object_url(&self, payload: &SavePayload) -> Result<String, String> {
        if self.refuse_object_urls.get() {
            return Err("object URL allocation refused".to_string());
        }
        let id = self.next_url.get() + 1;
        self.next_url.set(id);
        let url = format!("blob:shim/{id}");
        self.record(PlatformCall::CreateObjectUrl {
            url: url.clone(),
            bytes: payload.bytes.clone(),
        });
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        self.record(PlatformCall::RevokeObjectUrl {
            url: url.to_string(),
        });
    }

    fn click_download_anchor(&self, url: &str, filename: &str) -> Result<(), String> {
        self.record(PlatformCall::ClickAnchor {
            url: url.to_string(),
            filename: filename.to_string(),
        });
        Ok(())
    }

    fn open_in_new_context(&self, url: &str) -> bool {
        let opened = !self.popups_blocked.get();
        self.record(PlatformCall::OpenNewContext {
            url: url.to_string(),
            opened,
        });
        opened
    }

    fn navigate_current(&self, url: &str) -> Result<(), String> {
        self.record(PlatformCall::Navigate {
            url: url.to_string(),
        });
        Ok(())
    }

    fn read_as_data_uri<'a>(
        &'a self,
        payload: &'a SavePayload,
    ) -> SaveFuture<'a, Result<String, String>> {
        self.record(PlatformCall::ReadDataUri {
            mime_type: payload.mime_type.clone(),
        });
        let held = if self.hold_reads.get() {
            let (tx, rx) = oneshot::channel();
            self.held_reads.borrow_mut().push(tx);
            Some(rx)
        } else {
            None
        };
        Box::pin(async move {
            if let Some(rx) = held {
                rx.await.map_err(|_| "read cancelled".to_string())?;
            }
            Ok(format!(
                "data:{};base64,<{} bytes>",
                payload.mime_type,
                payload.bytes.len()
            ))
        })
    }
}

struct ScheduledTask {
    due_ms: u64,
    seq: u64,
    task: Box<dyn FnOnce()>,
}

#[derive(Clone, Default)]
/// Virtual-clock scheduler: tasks only run when the test advances time.
pub struct ManualScheduler {
    now_ms: Rc<Cell<u64>>,
    next_seq: Rc<Cell<u64>>,
    tasks: Rc<RefCell<Vec<ScheduledTask>>>,
    uncaught: Rc<RefCell<Vec<SaveHandlerError>>>,
}

impl ManualScheduler {
    /// Advances the clock by `delta_ms`, running due tasks in deadline order.
    pub fn advance_by(&self, delta_ms: u64) {
        let target = self.now_ms.get().saturating_add(delta_ms);
        loop {
            let next = {
                let mut tasks = self.tasks.borrow_mut();
                let due = tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, task)| task.due_ms <= target)
                    .min_by_key(|(_, task)| (task.due_ms, task.seq))
                    .map(|(index, _)| index);
                due.map(|index| tasks.remove(index))
            };
            let Some(task) = next else {
                break;
            };
            self.now_ms.set(self.now_ms.get().max(task.due_ms));
            (task.task)();
        }
        self.now_ms.set(target);
    }

    /// Returns the number of tasks not yet run.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Returns handler errors that reached the uncaught-error channel.
    pub fn uncaught_errors(&self) -> Vec<SaveHandlerError> {
        self.uncaught.borrow().clone()
    }
}

impl Scheduler for ManualScheduler {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn schedule(&self, delay_ms: u64, task: Box<dyn FnOnce()>) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.tasks.borrow_mut().push(ScheduledTask {
            due_ms: self.now_ms.get().saturating_add(delay_ms),
            seq,
            task,
        });
    }

    fn report_error(&self, error: SaveHandlerError) {
        let uncaught = self.uncaught.clone();
        self.schedule(0, Box::new(move || uncaught.borrow_mut().push(error)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_runs_tasks_in_deadline_order() {
        let scheduler = ManualScheduler::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, label) in [(30, "c"), (10, "a"), (20, "b"), (10, "a2")] {
            let log = log.clone();
            scheduler.schedule(delay, Box::new(move || log.borrow_mut().push(label)));
        }

        scheduler.advance_by(15);
        assert_eq!(*log.borrow(), vec!["a", "a2"]);
        assert_eq!(scheduler.now_ms(), 15);

        scheduler.advance_by(100);
        assert_eq!(*log.borrow(), vec!["a", "a2", "b", "c"]);
        assert_eq!(scheduler.pending_tasks(), 0);
    }

    #[test]
    fn tasks_scheduled_from_tasks_run_when_due() {
        let scheduler = ManualScheduler::default();
        let hits = Rc::new(Cell::new(0));
        let inner_scheduler = scheduler.clone();
        let inner_hits = hits.clone();
        scheduler.schedule(
            5,
            Box::new(move || {
                inner_scheduler.schedule(5, Box::new(move || inner_hits.set(inner_hits.get() + 1)));
            }),
        );

        scheduler.advance_by(9);
        assert_eq!(hits.get(), 0);
        scheduler.advance_by(1);
        assert_eq!(hits.get(), 1);
    }
}
