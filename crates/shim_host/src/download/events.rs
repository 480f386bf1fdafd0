//! Save lifecycle events, ready states, and the handler registry.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Lifecycle event fired by a save.
pub enum SaveEvent {
    /// The save started.
    WriteStart,
    /// Payload handed over.
    Progress,
    /// The payload was written.
    Write,
    /// Save aborted. Never fired; `abort` is a no-op.
    Abort,
    /// Platform failure.
    Error,
    /// Terminal event, fired once the state is [`ReadyState::Done`].
    WriteEnd,
}

impl SaveEvent {
    /// Every event, in declaration order.
    pub const ALL: [SaveEvent; 6] = [
        Self::WriteStart,
        Self::Progress,
        Self::Write,
        Self::Abort,
        Self::Error,
        Self::WriteEnd,
    ];

    /// Events fired by a successful save, in firing order.
    pub const COMPLETION: [SaveEvent; 4] =
        [Self::WriteStart, Self::Progress, Self::Write, Self::WriteEnd];

    /// Returns the DOM-style event name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WriteStart => "writestart",
            Self::Progress => "progress",
            Self::Write => "write",
            Self::Abort => "abort",
            Self::Error => "error",
            Self::WriteEnd => "writeend",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::WriteStart => 0,
            Self::Progress => 1,
            Self::Write => 2,
            Self::Abort => 3,
            Self::Error => 4,
            Self::WriteEnd => 5,
        }
    }
}

impl fmt::Display for SaveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// State of the most recent save on a shim.
pub enum ReadyState {
    /// No save has produced output yet.
    #[default]
    Init,
    /// Lifecycle events are being dispatched.
    Writing,
    /// The save finished; set right before `writeend`.
    Done,
}

impl ReadyState {
    /// Returns the numeric `readyState` exposed to page scripts.
    pub const fn code(self) -> u8 {
        match self {
            Self::Init => 0,
            Self::Writing => 1,
            Self::Done => 2,
        }
    }
}

/// Caller-registered lifecycle handler. An `Err` is reported asynchronously and never stops the
/// save.
pub type SaveHandler = Box<dyn FnMut(SaveEvent, ReadyState) -> Result<(), String>>;

#[derive(Default)]
/// One optional handler slot per [`SaveEvent`].
///
/// Every registration or removal bumps the slot's generation, so a handler taken out for
/// dispatch is only put back when nothing touched its slot meanwhile.
pub(crate) struct SaveEventHandlers {
    slots: [Option<SaveHandler>; 6],
    generations: [u64; 6],
}

impl SaveEventHandlers {
    pub(crate) fn set(&mut self, event: SaveEvent, handler: Option<SaveHandler>) {
        let slot = event.slot();
        self.slots[slot] = handler;
        self.generations[slot] += 1;
    }

    pub(crate) fn take(&mut self, event: SaveEvent) -> Option<(SaveHandler, u64)> {
        let slot = event.slot();
        self.slots[slot]
            .take()
            .map(|handler| (handler, self.generations[slot]))
    }

    /// Puts a handler back after dispatch unless it was replaced or cleared while running.
    pub(crate) fn restore(&mut self, event: SaveEvent, handler: SaveHandler, generation: u64) {
        let slot = event.slot();
        if self.generations[slot] == generation {
            self.slots[slot] = Some(handler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_owns_a_distinct_slot() {
        let mut slots: Vec<usize> = SaveEvent::ALL.iter().map(|event| event.slot()).collect();
        slots.dedup();
        assert_eq!(slots, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn restore_keeps_a_replacement_registered_during_dispatch() {
        let mut handlers = SaveEventHandlers::default();
        handlers.set(SaveEvent::Write, Some(Box::new(|_, _| Err("old".to_string()))));

        let (mut old, generation) = handlers.take(SaveEvent::Write).expect("registered");
        handlers.set(SaveEvent::Write, Some(Box::new(|_, _| Ok(()))));
        handlers.restore(
            SaveEvent::Write,
            Box::new(|_, _| Err("stale".to_string())),
            generation,
        );

        let (mut current, _) = handlers.take(SaveEvent::Write).expect("replacement");
        assert_eq!(current(SaveEvent::Write, ReadyState::Writing), Ok(()));
        assert_eq!(
            old(SaveEvent::Write, ReadyState::Writing),
            Err("old".to_string())
        );
    }

    #[test]
    fn restore_respects_a_removal_made_during_dispatch() {
        let mut handlers = SaveEventHandlers::default();
        handlers.set(SaveEvent::Progress, Some(Box::new(|_, _| Ok(()))));

        let (handler, generation) = handlers.take(SaveEvent::Progress).expect("registered");
        handlers.set(SaveEvent::Progress, None);
        handlers.restore(SaveEvent::Progress, handler, generation);

        assert!(handlers.take(SaveEvent::Progress).is_none());
    }

    #[test]
    fn ready_state_codes_follow_the_lifecycle() {
        assert_eq!(
            [ReadyState::Init, ReadyState::Writing, ReadyState::Done].map(ReadyState::code),
            [0, 1, 2]
        );
    }

    #[test]
    fn untouched_handler_is_restored() {
        let mut handlers = SaveEventHandlers::default();
        handlers.set(SaveEvent::Error, Some(Box::new(|_, _| Ok(()))));

        let (handler, generation) = handlers.take(SaveEvent::Error).expect("registered");
        handlers.restore(SaveEvent::Error, handler, generation);

        assert!(handlers.take(SaveEvent::Error).is_some());
    }
}
