//! Market data provider interface.

use crate::FeedError;
use async_trait::async_trait;
use carry_core::{Coin, FuturesContract};
use std::collections::HashSet;

/// Coins currently offering promotional yield, with annualized yield in
/// percent, in provider listing order.
pub type YieldUniverse = Vec<(Coin, f64)>;

/// Narrow interface to the market data provider.
///
/// `Ok(None)` means the provider answered but had no usable value.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Last spot price of `<coin>_USDT`.
    async fn spot_price(&self, coin: &Coin) -> Result<Option<f64>, FeedError>;

    /// Perpetual contract snapshot for `<coin>_USDT`.
    async fn futures_contract(&self, coin: &Coin) -> Result<Option<FuturesContract>, FeedError>;

    /// Most recent realized funding rate (percent).
    async fn latest_funding_rate(&self, coin: &Coin) -> Result<Option<f64>, FeedError>;

    /// Contract names that are tradable (not being delisted).
    async fn active_contracts(&self) -> Result<HashSet<String>, FeedError>;

    /// Coins with an active yield promotion.
    async fn yield_universe(&self) -> Result<YieldUniverse, FeedError>;
}
