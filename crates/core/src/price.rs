//! Market data snapshots gathered once per sampling cycle.

use serde::{Deserialize, Serialize};

/// Perpetual futures contract state as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuturesContract {
    /// Last traded futures price.
    pub last_price: f64,
    /// Currently quoted funding rate for the next settlement, in percent.
    pub funding_rate_pct: f64,
    /// Hours between funding settlements (rounded to 2 decimals).
    pub funding_interval_hours: f64,
    /// Unix epoch seconds of the next funding settlement.
    pub funding_next_apply: f64,
}

/// Everything the signal computation needs for one coin in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub spot_price: Option<f64>,
    pub futures: FuturesContract,
    /// Most recent realized funding rate in percent. Only fetched when the
    /// quoted rate is not yet close enough to settlement to be trusted.
    pub realized_funding_rate_pct: Option<f64>,
}

impl MarketSnapshot {
    pub fn new(spot_price: Option<f64>, futures: FuturesContract) -> Self {
        Self {
            spot_price,
            futures,
            realized_funding_rate_pct: None,
        }
    }

    pub fn with_realized_funding(mut self, rate_pct: Option<f64>) -> Self {
        self.realized_funding_rate_pct = rate_pct;
        self
    }

    /// Both legs present and strictly positive.
    pub fn has_valid_prices(&self) -> bool {
        matches!(self.spot_price, Some(spot) if spot > 0.0) && self.futures.last_price > 0.0
    }
}
