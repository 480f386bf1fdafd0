//! Window-level key-down filter.

use std::{cell::RefCell, rc::Rc};

use shim_host::{KeyFilterPolicy, KeyStroke};

use crate::bridge::{self, ListenerGuard};

thread_local! {
    static KEY_FILTER: RefCell<Option<ListenerGuard>> = RefCell::new(None);
}

/// Installs the key-down filter for the lifetime of the page.
///
/// Suppressed strokes only have their default action prevented; propagation is untouched.
/// Returns `Ok(false)` when a filter is already installed.
///
/// # Errors
///
/// Returns an error when the window listener cannot be attached.
pub fn install_key_filter(policy: KeyFilterPolicy) -> Result<bool, String> {
    KEY_FILTER.with(|slot| {
        if slot.borrow().is_some() {
            return Ok(false);
        }
        let guard = bridge::watch_window_keydown(Rc::new(move |stroke: KeyStroke| {
            policy.should_suppress(stroke)
        }))?;
        *slot.borrow_mut() = Some(guard);
        Ok(true)
    })
}

/// Returns whether the key-down filter is installed.
pub fn key_filter_installed() -> bool {
    KEY_FILTER.with(|slot| slot.borrow().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_install_fails_and_leaves_nothing_installed() {
        let err = install_key_filter(KeyFilterPolicy::default()).expect_err("needs a window");
        assert_eq!(err, "Browser APIs are only available when compiled for wasm32");
        assert!(!key_filter_installed());
    }
}
