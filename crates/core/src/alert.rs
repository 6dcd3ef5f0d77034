//! Alert events produced by the signal engine.

use crate::Coin;
use serde::{Deserialize, Serialize};

/// What the alert recommends doing with the carry position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    /// Open the position: expected return dropped to the open threshold.
    Enter,
    /// Close the position: expected return rose to the close threshold.
    Exit,
}

/// Derived figures for one coin in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub spot_price: f64,
    pub futures_price: f64,
    /// (spot - futures) / futures * 100
    pub gap_pct: f64,
    pub funding_interval_hours: f64,
    /// Funding rate actually used (quoted or realized), in percent.
    pub funding_rate_pct: f64,
    /// Seconds until the next funding settlement; negative if already past.
    pub seconds_to_funding: f64,
    pub funding_times_per_day: u32,
    pub annual_yield_pct: f64,
    pub daily_yield_pct: f64,
    pub daily_funding_fee_pct: f64,
    /// Rounded to 4 decimals.
    pub expected_daily_return_pct: f64,
}

/// A single alert, rendered and delivered immediately; never queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub coin: Coin,
    pub kind: Recommendation,
    pub report: SignalReport,
}

impl AlertEvent {
    pub fn contract(&self) -> String {
        self.coin.contract()
    }
}
