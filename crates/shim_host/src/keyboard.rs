//! Keyboard shortcut suppression policy.
//!
//! The page forwards every window-level key-down here; a `true` verdict means the browser's
//! default action is prevented while the event still propagates to the hosted application.

use serde::{Deserialize, Serialize};

/// Key code that reloads the page when combined with Ctrl (`R`).
pub const RELOAD_KEY_CODE: u32 = 82;

/// Navigation, editing and function keys whose browser defaults are suppressed.
///
/// Backspace, Escape, PageUp/PageDown, End/Home, the arrow keys, F11, and the legacy
/// punctuation codes 58-62.
pub const DEFAULT_PLAIN_KEY_CODES: [u32; 16] =
    [8, 27, 33, 34, 35, 36, 37, 38, 39, 40, 122, 58, 59, 60, 61, 62];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The parts of a key-down event the policy inspects.
pub struct KeyStroke {
    /// Legacy `keyCode` of the event.
    pub key_code: u32,
    /// Whether the Control modifier was held.
    pub ctrl: bool,
}

impl KeyStroke {
    /// Key press without Control.
    pub const fn plain(key_code: u32) -> Self {
        Self {
            key_code,
            ctrl: false,
        }
    }

    /// Key press with Control held.
    pub const fn with_ctrl(key_code: u32) -> Self {
        Self {
            key_code,
            ctrl: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Stateless set of suppressed key strokes.
pub struct KeyFilterPolicy {
    /// Codes suppressed only while Control is held.
    pub ctrl_key_codes: Vec<u32>,
    /// Codes suppressed with or without modifiers.
    pub plain_key_codes: Vec<u32>,
}

impl Default for KeyFilterPolicy {
    fn default() -> Self {
        Self {
            ctrl_key_codes: vec![RELOAD_KEY_CODE],
            plain_key_codes: DEFAULT_PLAIN_KEY_CODES.to_vec(),
        }
    }
}

impl KeyFilterPolicy {
    /// Returns whether the browser default for `stroke` must be prevented.
    pub fn should_suppress(&self, stroke: KeyStroke) -> bool {
        (stroke.ctrl && self.ctrl_key_codes.contains(&stroke.key_code))
            || self.plain_key_codes.contains(&stroke.key_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_r_is_suppressed_but_plain_r_is_not() {
        let policy = KeyFilterPolicy::default();
        assert!(policy.should_suppress(KeyStroke::with_ctrl(82)));
        assert!(!policy.should_suppress(KeyStroke::plain(82)));
    }

    #[test]
    fn navigation_and_function_keys_are_suppressed_regardless_of_ctrl() {
        let policy = KeyFilterPolicy::default();
        for code in DEFAULT_PLAIN_KEY_CODES {
            assert!(policy.should_suppress(KeyStroke::plain(code)), "code {code}");
            assert!(policy.should_suppress(KeyStroke::with_ctrl(code)), "ctrl+{code}");
        }
    }

    #[test]
    fn ordinary_keys_pass_through() {
        let policy = KeyFilterPolicy::default();
        for code in [13, 32, 65, 90, 112, 123] {
            assert!(!policy.should_suppress(KeyStroke::plain(code)), "code {code}");
        }
        assert!(!policy.should_suppress(KeyStroke::with_ctrl(67)));
    }

    #[test]
    fn policy_lists_come_from_configuration() {
        let policy: KeyFilterPolicy =
            serde_json::from_str(r#"{"plain_key_codes": [116]}"#).expect("parse");
        assert!(policy.should_suppress(KeyStroke::plain(116)));
        assert!(!policy.should_suppress(KeyStroke::plain(8)));
        assert!(policy.should_suppress(KeyStroke::with_ctrl(82)));
    }
}
