//! Time helpers shared across shim contracts and adapters.

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Returns how long to wait at `now_ms` so that a deadline of `started_at_ms + delay_ms` is
/// honored. Returns zero once the deadline has passed.
pub fn remaining_delay_ms(started_at_ms: u64, delay_ms: u64, now_ms: u64) -> u64 {
    started_at_ms
        .saturating_add(delay_ms)
        .saturating_sub(now_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_delay_counts_down_to_zero() {
        assert_eq!(remaining_delay_ms(1_000, 40_000, 1_000), 40_000);
        assert_eq!(remaining_delay_ms(1_000, 40_000, 11_000), 30_000);
        assert_eq!(remaining_delay_ms(1_000, 40_000, 41_000), 0);
        assert_eq!(remaining_delay_ms(1_000, 40_000, 90_000), 0);
    }
}
