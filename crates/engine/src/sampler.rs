//! Market sampler loop.
//!
//! Each cycle refreshes the yield universe, then evaluates every tracked coin
//! that still has a live futures contract and forwards any alert right away.

use crate::funding::uses_quoted_rate;
use crate::signal;
use crate::watch::SharedWatch;
use async_trait::async_trait;
use carry_core::{AlertEvent, Coin, MarketSnapshot};
use carry_feeds::{FeedError, MarketData};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
#[error("alert delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Outbound side of the notification channel, as seen by the sampler.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, event: &AlertEvent) -> Result<(), DeliveryError>;
}

/// What one sampler iteration did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Alerts were switched off; no gateway was contacted.
    pub paused: bool,
    pub universe_size: usize,
    /// Coins for which a snapshot was gathered and evaluated.
    pub evaluated: usize,
    pub alerts_sent: usize,
    pub failures: usize,
}

/// Periodic market sampler.
pub struct MarketSampler {
    market: Arc<dyn MarketData>,
    sink: Arc<dyn AlertSink>,
    watch: SharedWatch,
}

impl MarketSampler {
    pub fn new(market: Arc<dyn MarketData>, sink: Arc<dyn AlertSink>, watch: SharedWatch) -> Self {
        Self { market, sink, watch }
    }

    /// Run forever. The interval is re-read at the top of every iteration,
    /// so a change made while sleeping applies from the next one.
    pub async fn run(self) {
        info!("Starting market sampler");

        loop {
            let interval = self.watch.poll_interval();

            let summary = self.run_cycle().await;
            if !summary.paused {
                info!(
                    "⏳ Cycle done | universe: {} | evaluated: {} | alerts: {} | failures: {} | next in {}s",
                    summary.universe_size,
                    summary.evaluated,
                    summary.alerts_sent,
                    summary.failures,
                    interval.as_secs()
                );
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// One iteration at the current wall-clock time.
    pub async fn run_cycle(&self) -> CycleSummary {
        self.run_cycle_at(Utc::now()).await
    }

    /// One iteration with an explicit clock, without the trailing sleep.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> CycleSummary {
        let mut summary = CycleSummary::default();

        if !self.watch.alerts_enabled() {
            debug!("Alerts paused, skipping cycle");
            summary.paused = true;
            return summary;
        }

        let universe = match self.market.yield_universe().await {
            Ok(universe) => universe,
            Err(e) => {
                warn!(error = %e, "Failed to fetch yield universe");
                summary.failures += 1;
                Vec::new()
            }
        };
        self.watch
            .replace_universe(universe.iter().map(|(coin, _)| coin.clone()).collect());
        summary.universe_size = universe.len();

        // Contract list is only needed once something is tracked; a failed
        // fetch is retried for the next tracked coin.
        let mut active: Option<HashSet<String>> = None;

        for (coin, annual_yield_pct) in &universe {
            if !self.watch.is_tracked(coin) {
                continue;
            }

            if active.is_none() {
                match self.market.active_contracts().await {
                    Ok(contracts) => active = Some(contracts),
                    Err(e) => {
                        warn!(coin = %coin, error = %e, "Failed to fetch active contracts");
                        summary.failures += 1;
                        continue;
                    }
                }
            }
            let is_listed = active
                .as_ref()
                .is_some_and(|contracts| contracts.contains(&coin.contract()));
            if !is_listed {
                debug!(coin = %coin, "No active futures contract, skipping");
                continue;
            }

            let snapshot = match self.gather_snapshot(coin, now).await {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => {
                    debug!(coin = %coin, "No market data, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(coin = %coin, error = %e, "Failed to fetch market data");
                    summary.failures += 1;
                    continue;
                }
            };
            summary.evaluated += 1;

            let Some(event) = signal::evaluate(coin, *annual_yield_pct, &snapshot, &self.watch, now)
            else {
                continue;
            };

            match self.sink.deliver(&event).await {
                Ok(()) => {
                    info!(
                        coin = %coin,
                        kind = ?event.kind,
                        expected = event.report.expected_daily_return_pct,
                        "Alert sent"
                    );
                    summary.alerts_sent += 1;
                }
                Err(e) => {
                    warn!(coin = %coin, error = %e, "Failed to send alert");
                    summary.failures += 1;
                }
            }
        }

        summary
    }

    /// Fetch spot and futures concurrently; the realized funding rate only
    /// when the quoted one is not yet usable.
    async fn gather_snapshot(
        &self,
        coin: &Coin,
        now: DateTime<Utc>,
    ) -> Result<Option<MarketSnapshot>, FeedError> {
        let (contract, spot) = tokio::join!(
            self.market.futures_contract(coin),
            self.market.spot_price(coin)
        );
        let Some(contract) = contract? else {
            return Ok(None);
        };
        let snapshot = MarketSnapshot::new(spot?, contract);

        if !snapshot.has_valid_prices() || uses_quoted_rate(&contract, now) {
            return Ok(Some(snapshot));
        }

        let realized = self.market.latest_funding_rate(coin).await?;
        Ok(Some(snapshot.with_realized_funding(realized)))
    }
}
