//! Intake dialog view contract and an in-memory stand-in.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// View side of the intake dialog.
pub trait IntakeDialog {
    /// Shows or hides the modal.
    fn set_visible(&self, visible: bool);

    /// Resets the file-selection control so the same file can be chosen again.
    fn clear_selection(&self);
}

#[derive(Debug, Clone, Default)]
/// Dialog stand-in that mimics a file input's change semantics.
///
/// Like a browser file input, choosing the file that is already selected produces no change.
pub struct MemoryIntakeDialog {
    visible: Rc<Cell<bool>>,
    selection: Rc<RefCell<Option<String>>>,
    clears: Rc<Cell<usize>>,
}

impl MemoryIntakeDialog {
    /// Returns whether the modal is shown.
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Returns the currently selected filename.
    pub fn selection(&self) -> Option<String> {
        self.selection.borrow().clone()
    }

    /// Returns how many times the selection was cleared.
    pub fn clear_count(&self) -> usize {
        self.clears.get()
    }

    /// Simulates the user picking `filename`; returns whether a change event would fire.
    pub fn choose(&self, filename: &str) -> bool {
        let mut selection = self.selection.borrow_mut();
        if selection.as_deref() == Some(filename) {
            return false;
        }
        *selection = Some(filename.to_string());
        true
    }
}

impl IntakeDialog for MemoryIntakeDialog {
    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn clear_selection(&self) {
        self.selection.borrow_mut().take();
        self.clears.set(self.clears.get() + 1);
    }
}
