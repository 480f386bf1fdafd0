//! DOM-backed intake dialog and the wiring that feeds its events to the controller.
//!
//! Listeners on the close control, the backdrop, and the file input exist only while the modal
//! is visible.

use std::{cell::RefCell, rc::Rc};

use leptos::logging::warn;
use shim_host::{CancelTrigger, IntakeController, IntakeDialog, IntakeDialogConfig};
use wasm_bindgen_futures::spawn_local;

use crate::bridge::{self, ListenerGuard};

/// User interaction observed on the intake dialog.
pub enum IntakeSignal {
    /// The close control was clicked.
    Close,
    /// The backdrop outside the dialog body was clicked.
    Backdrop,
    /// A file was picked in the file input.
    FileChosen(web_sys::File),
}

/// Intake dialog controller over the page's DOM.
pub type WebIntakeController = IntakeController<WebIntakeDialog>;

/// Intake dialog bound to DOM element ids.
pub struct WebIntakeDialog {
    config: IntakeDialogConfig,
    sink: RefCell<Option<Rc<dyn Fn(IntakeSignal)>>>,
    listeners: RefCell<Vec<ListenerGuard>>,
}

impl WebIntakeDialog {
    /// Creates a dialog for the configured element ids. Nothing is wired until it is shown.
    pub fn new(config: IntakeDialogConfig) -> Self {
        Self {
            config,
            sink: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Returns the DOM hooks.
    pub fn config(&self) -> &IntakeDialogConfig {
        &self.config
    }

    fn connect(&self, sink: Rc<dyn Fn(IntakeSignal)>) {
        *self.sink.borrow_mut() = Some(sink);
    }

    fn attach_listeners(&self) {
        let Some(sink) = self.sink.borrow().clone() else {
            warn!("[intake] dialog shown before it was connected");
            return;
        };
        self.detach_listeners();
        match bridge::watch_intake_dialog(&self.config, sink) {
            Ok(guards) => *self.listeners.borrow_mut() = guards,
            Err(err) => warn!("[intake] failed to wire dialog: {err}"),
        }
    }

    fn detach_listeners(&self) {
        let guards = std::mem::take(&mut *self.listeners.borrow_mut());
        if guards.is_empty() {
            return;
        }
        // Detaching can run inside one of these listeners; drop them on the next tick.
        let _ = bridge::set_timeout(0, Box::new(move || drop(guards)));
    }
}

impl IntakeDialog for WebIntakeDialog {
    fn set_visible(&self, visible: bool) {
        if let Err(err) = bridge::set_element_visible(&self.config.modal_id, visible) {
            warn!("[intake] {err}");
        }
        if visible {
            self.attach_listeners();
        } else {
            self.detach_listeners();
        }
    }

    fn clear_selection(&self) {
        if let Err(err) = bridge::clear_file_input(&self.config.input_id) {
            warn!("[intake] {err}");
        }
    }
}

/// Builds the page's intake controller and routes dialog signals into it.
pub fn intake_controller(config: &IntakeDialogConfig) -> Rc<WebIntakeController> {
    let controller = Rc::new(IntakeController::new(WebIntakeDialog::new(config.clone())));
    let weak = Rc::downgrade(&controller);
    controller.dialog().connect(Rc::new(move |signal: IntakeSignal| {
        if let Some(controller) = weak.upgrade() {
            route_signal(&controller, signal);
        }
    }));
    controller
}

fn route_signal(controller: &Rc<WebIntakeController>, signal: IntakeSignal) {
    match signal {
        IntakeSignal::Close => {
            controller.cancel(CancelTrigger::CloseControl);
        }
        IntakeSignal::Backdrop => {
            controller.cancel(CancelTrigger::Backdrop);
        }
        IntakeSignal::FileChosen(file) => {
            let controller = controller.clone();
            spawn_local(async move {
                let filename = file.name();
                let result = controller
                    .select_file(&filename, move || async move {
                        bridge::read_file_bytes(&file).await
                    })
                    .await;
                if let Err(err) = result {
                    warn!("[intake] {err}");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;
    use shim_host::Visibility;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_dialog_still_drives_the_session() {
        let controller = intake_controller(&IntakeDialogConfig::default());
        let cancelled = Rc::new(Cell::new(0));
        let seen = cancelled.clone();

        controller
            .request_file(Box::new(move |outcome| {
                assert_eq!(outcome.into_parts(), (None, None));
                seen.set(seen.get() + 1);
            }))
            .expect("open");
        assert_eq!(controller.visibility(), Visibility::Visible);

        route_signal(&controller, IntakeSignal::Backdrop);
        route_signal(&controller, IntakeSignal::Close);

        assert_eq!(cancelled.get(), 1);
        assert_eq!(controller.visibility(), Visibility::Hidden);
        assert_eq!(controller.dialog().config().modal_id, "add-modal");
    }
}
