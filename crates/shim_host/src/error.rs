//! Typed error taxonomy shared by the shim controllers.
//!
//! Platform seams report failures as plain `String`s; controllers lift them into these enums so
//! callers can branch on the failing operation without parsing messages.

use thiserror::Error;

use crate::download::SaveEvent;

/// Failures raised by the offline cache controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A manifest entry could not be fetched while pre-caching; no bucket was created.
    #[error("precache of `{url}` failed: {reason}")]
    Precache {
        /// URL of the manifest entry that failed.
        url: String,
        /// Failure detail reported by the network or the status check.
        reason: String,
    },
    /// The network request for a cache miss failed.
    #[error("network request for `{url}` failed: {reason}")]
    Network {
        /// URL of the forwarded request.
        url: String,
        /// Failure detail reported by the network.
        reason: String,
    },
    /// The cache store rejected an operation.
    #[error("cache store error: {0}")]
    Store(String),
}

/// Failures raised by the download shim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    /// Another save is still running on the same shim instance.
    #[error("a save is already in progress")]
    SaveInProgress,
    /// The browser platform refused one of the save steps.
    #[error("save failed: {0}")]
    Platform(String),
}

/// Error returned by a caller-registered save lifecycle handler.
///
/// These never abort a save. The shim hands them to [`crate::download::Scheduler::report_error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{event}` handler failed: {message}")]
pub struct SaveHandlerError {
    /// Event whose handler failed.
    pub event: SaveEvent,
    /// Handler-provided failure message.
    pub message: String,
}

/// Failures raised by the file intake controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    /// A dialog session is already open.
    #[error("an intake session is already open")]
    SessionOpen,
    /// Reading the selected file failed; the session stays open.
    #[error("failed to read `{filename}`: {reason}")]
    Read {
        /// Name of the selected file.
        filename: String,
        /// Failure detail reported by the file reader.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_failing_target() {
        let err = CacheError::Precache {
            url: "/tic80.wasm".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert_eq!(err.to_string(), "precache of `/tic80.wasm` failed: HTTP 404");

        let err = SaveHandlerError {
            event: SaveEvent::WriteEnd,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "`writeend` handler failed: boom");
    }
}
