//! Funding-carry signal computation.
//!
//! Combines the spot/futures gap, the funding cost of the futures leg and the
//! promotional yield of the spot leg into an expected daily return, then
//! classifies it against the open/close thresholds.

use crate::funding::{seconds_until_funding, settlements_per_day, uses_quoted_rate};
use crate::watch::WatchConfig;
use carry_core::{AlertEvent, Coin, MarketSnapshot, Recommendation, SignalReport};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Expected-daily-return thresholds in percent.
///
/// `open` triggers an entry recommendation for coins not yet entered,
/// `close` triggers an exit recommendation for entered coins. The two are
/// independent; `close < open` is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub open: f64,
    pub close: f64,
}

/// Where a tracked coin stands, which decides the threshold that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    /// Tracked, no position yet.
    Watching,
    /// Tracked with an open position.
    Entered,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Derive every figure for one coin from a fresh snapshot.
///
/// Returns None when either price is missing or non-positive, when the
/// funding interval is unusable, or when the realized funding rate is needed
/// but was not available.
pub fn compute_report(
    annual_yield_pct: f64,
    snapshot: &MarketSnapshot,
    now: DateTime<Utc>,
) -> Option<SignalReport> {
    if !snapshot.has_valid_prices() {
        debug!(
            spot = ?snapshot.spot_price,
            futures = snapshot.futures.last_price,
            "Price missing or zero, no signal"
        );
        return None;
    }
    let spot_price = snapshot.spot_price?;
    let futures = &snapshot.futures;
    let futures_price = futures.last_price;

    let gap_pct = (spot_price - futures_price) / futures_price * 100.0;

    let funding_rate_pct = if uses_quoted_rate(futures, now) {
        futures.funding_rate_pct
    } else {
        snapshot.realized_funding_rate_pct?
    };

    let funding_times_per_day = settlements_per_day(futures.funding_interval_hours)?;
    let daily_funding_fee_pct = -funding_rate_pct * funding_times_per_day as f64;
    let daily_yield_pct = annual_yield_pct / 365.0;
    let expected_daily_return_pct = round4(daily_yield_pct - daily_funding_fee_pct);

    Some(SignalReport {
        spot_price,
        futures_price,
        gap_pct,
        funding_interval_hours: futures.funding_interval_hours,
        funding_rate_pct,
        seconds_to_funding: seconds_until_funding(futures.funding_next_apply, now),
        funding_times_per_day,
        annual_yield_pct,
        daily_yield_pct,
        daily_funding_fee_pct,
        expected_daily_return_pct,
    })
}

/// Compare an expected daily return against the threshold for `state`.
pub fn classify(
    expected_daily_return_pct: f64,
    state: PositionState,
    thresholds: Thresholds,
) -> Option<Recommendation> {
    match state {
        PositionState::Entered if expected_daily_return_pct >= thresholds.close => {
            Some(Recommendation::Exit)
        }
        PositionState::Watching if expected_daily_return_pct <= thresholds.open => {
            Some(Recommendation::Enter)
        }
        _ => None,
    }
}

/// Run the full signal for one coin against the current watch state.
///
/// Produces at most one alert. Coins that are not tracked never alert.
pub fn evaluate(
    coin: &Coin,
    annual_yield_pct: f64,
    snapshot: &MarketSnapshot,
    watch: &WatchConfig,
    now: DateTime<Utc>,
) -> Option<AlertEvent> {
    let report = compute_report(annual_yield_pct, snapshot, now)?;

    if !watch.is_tracked(coin) {
        return None;
    }
    let state = if watch.is_entered(coin) {
        PositionState::Entered
    } else {
        PositionState::Watching
    };

    let kind = classify(report.expected_daily_return_pct, state, watch.thresholds())?;
    Some(AlertEvent {
        coin: coin.clone(),
        kind,
        report,
    })
}
