//! File intake domain: the modal session state machine and its view contract.

mod controller;
mod dialog;

pub use controller::{
    CancelTrigger, FileBuffer, IntakeCallback, IntakeController, IntakeOutcome, PendingRead,
    Visibility,
};
pub use dialog::{IntakeDialog, MemoryIntakeDialog};
