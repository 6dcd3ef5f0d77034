//! Gate.io REST market data client.
//!
//! Spot and futures figures come from the public v4 API; promotional yield
//! comes from the launch-pool project listing on the web API.

use crate::error::FeedError;
use crate::source::{MarketData, YieldUniverse};
use async_trait::async_trait;
use carry_core::{Coin, FuturesContract};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Round to a fixed number of decimals.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Gate returns most numbers as strings, some as JSON numbers.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        Value::String(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected number, got {}", other))),
    }
}

#[derive(Debug, Deserialize)]
struct SpotTicker {
    #[serde(deserialize_with = "lenient_f64")]
    last: f64,
}

#[derive(Debug, Deserialize)]
struct ContractDetail {
    #[serde(deserialize_with = "lenient_f64")]
    last_price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    funding_rate: f64,
    /// Seconds between settlements.
    #[serde(deserialize_with = "lenient_f64")]
    funding_interval: f64,
    #[serde(deserialize_with = "lenient_f64")]
    funding_next_apply: f64,
}

#[derive(Debug, Deserialize)]
struct ContractListing {
    name: String,
    #[serde(default)]
    in_delisting: bool,
}

#[derive(Debug, Deserialize)]
struct FundingRecord {
    #[serde(deserialize_with = "lenient_f64")]
    r: f64,
}

#[derive(Debug, Deserialize)]
struct LaunchPoolResponse {
    data: LaunchPoolData,
}

#[derive(Debug, Deserialize)]
struct LaunchPoolData {
    #[serde(default)]
    list: Vec<LaunchPoolProject>,
}

#[derive(Debug, Deserialize)]
struct LaunchPoolProject {
    #[serde(default)]
    project_state: i64,
    #[serde(default)]
    coin: Option<String>,
    #[serde(default)]
    reward_pools: Vec<RewardPool>,
}

#[derive(Debug, Deserialize)]
struct RewardPool {
    #[serde(default)]
    coin: Option<String>,
    #[serde(default)]
    rate_year: Option<Value>,
}

/// Project state flag for a launch pool that is currently running.
const PROJECT_STATE_ACTIVE: i64 = 1;

/// Parse the spot tickers response; first element's `last`.
pub fn parse_spot_price(json: Value) -> Result<Option<f64>, FeedError> {
    let tickers: Vec<SpotTicker> = serde_json::from_value(json)?;
    Ok(tickers.first().map(|t| t.last))
}

/// Parse a single contract detail into a typed snapshot (rates in percent).
pub fn parse_contract(json: Value) -> Result<FuturesContract, FeedError> {
    let detail: ContractDetail = serde_json::from_value(json)?;
    Ok(FuturesContract {
        last_price: detail.last_price,
        funding_rate_pct: detail.funding_rate * 100.0,
        funding_interval_hours: round_to(detail.funding_interval / 3600.0, 2),
        funding_next_apply: detail.funding_next_apply,
    })
}

/// Parse the funding history response; newest record's rate in percent.
pub fn parse_latest_funding_rate(json: Value) -> Result<Option<f64>, FeedError> {
    let records: Vec<FundingRecord> = serde_json::from_value(json)?;
    Ok(records.first().map(|r| r.r * 100.0))
}

/// Parse the contract list, keeping contracts not in delisting.
pub fn parse_active_contracts(json: Value) -> Result<HashSet<String>, FeedError> {
    let listings: Vec<ContractListing> = serde_json::from_value(json)?;
    Ok(listings
        .into_iter()
        .filter(|c| !c.in_delisting)
        .map(|c| c.name)
        .collect())
}

/// Parse the launch-pool listing into coin -> annual yield.
///
/// Only running projects count, and the yield is taken from the first reward
/// pool paying out in the project's own coin.
pub fn parse_yield_universe(json: Value) -> Result<YieldUniverse, FeedError> {
    let response: LaunchPoolResponse = serde_json::from_value(json)?;
    let mut universe: YieldUniverse = Vec::new();

    for project in response.data.list {
        if project.project_state != PROJECT_STATE_ACTIVE {
            continue;
        }
        let Some(coin_name) = project.coin else {
            continue;
        };
        let Some(pool) = project
            .reward_pools
            .iter()
            .find(|p| p.coin.as_deref() == Some(coin_name.as_str()))
        else {
            continue;
        };

        let apr = match &pool.rate_year {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| FeedError::ParseError(format!("rate_year for {}: {}", coin_name, e)))?,
            _ => 0.0,
        };

        let coin = match Coin::new(&coin_name) {
            Ok(c) => c,
            Err(e) => {
                debug!("GateIO: skipping launch pool coin {:?}: {}", coin_name, e);
                continue;
            }
        };

        if let Some(entry) = universe.iter_mut().find(|(c, _)| *c == coin) {
            entry.1 = apr;
        } else {
            universe.push((coin, apr));
        }
    }

    Ok(universe)
}

/// Gate.io REST client.
#[derive(Clone)]
pub struct GateIoRestClient {
    http: reqwest::Client,
    api_base: String,
    web_base: String,
}

impl GateIoRestClient {
    const API_BASE_URL: &'static str = "https://api.gateio.ws/api/v4";
    const WEB_BASE_URL: &'static str = "https://www.gate.io/apiw/v2";

    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Http(e.to_string()))?;

        Ok(Self {
            http,
            api_base: Self::API_BASE_URL.to_string(),
            web_base: Self::WEB_BASE_URL.to_string(),
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, FeedError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl MarketData for GateIoRestClient {
    async fn spot_price(&self, coin: &Coin) -> Result<Option<f64>, FeedError> {
        let url = format!("{}/spot/tickers", self.api_base);
        let json = self
            .get_json(&url, &[("currency_pair", coin.contract())])
            .await?;
        parse_spot_price(json)
    }

    async fn futures_contract(&self, coin: &Coin) -> Result<Option<FuturesContract>, FeedError> {
        let url = format!("{}/futures/usdt/contracts/{}", self.api_base, coin.contract());
        let json = self.get_json(&url, &[]).await?;
        parse_contract(json).map(Some)
    }

    async fn latest_funding_rate(&self, coin: &Coin) -> Result<Option<f64>, FeedError> {
        let url = format!("{}/futures/usdt/funding_rate", self.api_base);
        let json = self
            .get_json(
                &url,
                &[("contract", coin.contract()), ("limit", "1".to_string())],
            )
            .await?;
        parse_latest_funding_rate(json)
    }

    async fn active_contracts(&self) -> Result<HashSet<String>, FeedError> {
        let url = format!("{}/futures/usdt/contracts", self.api_base);
        let json = self.get_json(&url, &[]).await?;
        let contracts = parse_active_contracts(json)?;
        debug!("GateIO: {} active futures contracts", contracts.len());
        Ok(contracts)
    }

    async fn yield_universe(&self) -> Result<YieldUniverse, FeedError> {
        let url = format!("{}/earn/launch-pool/project-list", self.web_base);
        let json = self
            .get_json(
                &url,
                &[
                    ("page", "1".to_string()),
                    ("pageSize", "50".to_string()),
                    ("status", "0".to_string()),
                ],
            )
            .await?;
        let universe = parse_yield_universe(json)?;
        debug!("GateIO: {} launch pools with yield", universe.len());
        Ok(universe)
    }
}
