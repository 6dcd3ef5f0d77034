//! Funding schedule helpers.

use carry_core::FuturesContract;
use chrono::{DateTime, Utc};
use tracing::debug;

/// The quoted next funding rate is only trusted this close to settlement.
pub const QUOTED_RATE_WINDOW_SECS: f64 = 1800.0;

/// Seconds from `now` until the next funding settlement (negative if past).
pub fn seconds_until_funding(next_apply_epoch: f64, now: DateTime<Utc>) -> f64 {
    next_apply_epoch - now.timestamp_millis() as f64 / 1000.0
}

/// True if the settlement falls within `(0, 1800]` seconds from now.
pub fn is_within_quoted_window(seconds_left: f64) -> bool {
    seconds_left > 0.0 && seconds_left <= QUOTED_RATE_WINDOW_SECS
}

/// Whether the contract's quoted rate should be used instead of the last
/// realized one.
pub fn uses_quoted_rate(contract: &FuturesContract, now: DateTime<Utc>) -> bool {
    let seconds_left = seconds_until_funding(contract.funding_next_apply, now);
    debug!(seconds_left, "Funding window check");
    is_within_quoted_window(seconds_left)
}

/// Number of whole settlements per day, or None for a non-positive interval.
pub fn settlements_per_day(interval_hours: f64) -> Option<u32> {
    if !interval_hours.is_finite() || interval_hours <= 0.0 {
        return None;
    }
    Some((24.0 / interval_hours).floor() as u32)
}
