//! BTC/USD price data from the CoinGecko public API.

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use configuration::ProviderSettings;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::MarketDataError;
use crate::PriceProvider;
use core_types::{CurrentPrice, PricePoint};

const COINGECKO_BASE: &str = "https://api.coingecko.com/api/v3";

// Some public endpoints reject requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A `PriceProvider` backed by CoinGecko's `market_chart` and `simple/price`
/// endpoints, with a read-through TTL cache per endpoint family.
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    spot_cache: TtlCache<CurrentPrice>,
    history_cache: TtlCache<Vec<PricePoint>>,
}

impl CoinGeckoClient {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build reqwest client"),
            base_url: COINGECKO_BASE.to_string(),
            api_key: settings.coingecko_api_key.clone(),
            spot_cache: TtlCache::new(Duration::from_secs(settings.spot_cache_ttl_secs)),
            history_cache: TtlCache::new(Duration::from_secs(settings.history_cache_ttl_secs)),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, MarketDataError> {
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(MarketDataError::Api(format!(
                "CoinGecko returned {status}: {text}"
            )));
        }
        serde_json::from_str::<T>(&text).map_err(|e| MarketDataError::Deserialization(e.to_string()))
    }

    /// Raw (possibly intraday) samples for the requested range, ascending.
    async fn price_history(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let from = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // The range parameter is inclusive of seconds, so step past the end day.
        let to = (end + Days::new(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let url = format!(
            "{}/coins/bitcoin/market_chart/range?vs_currency=usd&from={from}&to={to}",
            self.base_url
        );
        let response: MarketChartResponse = self.get_json(&url).await?;

        let mut points = Vec::with_capacity(response.prices.len());
        for (millis, price) in response.prices {
            let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                MarketDataError::InvalidData(format!("timestamp {millis} out of range"))
            })?;
            let price = Decimal::from_f64(price)
                .ok_or_else(|| MarketDataError::InvalidData(format!("price {price} not finite")))?;
            points.push(PricePoint { timestamp, price });
        }
        Ok(points)
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoClient {
    async fn daily_prices(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let cache_key = format!("daily:{start}:{end}");
        if let Some(cached) = self.history_cache.get(&cache_key) {
            return Ok(cached);
        }

        let samples = self.price_history(start, end).await?;

        // Deduplicate to one sample per calendar day, keeping the first.
        let mut daily: BTreeMap<NaiveDate, PricePoint> = BTreeMap::new();
        for point in samples {
            daily.entry(point.date_key()).or_insert(point);
        }
        let prices: Vec<PricePoint> = daily.into_values().collect();

        self.history_cache.insert(cache_key, prices.clone());
        Ok(prices)
    }

    async fn current_price(&self) -> Result<CurrentPrice, MarketDataError> {
        if let Some(cached) = self.spot_cache.get("spot") {
            return Ok(cached);
        }

        let url = format!(
            "{}/simple/price?ids=bitcoin&vs_currencies=usd&include_24hr_change=true&include_market_cap=true",
            self.base_url
        );
        let response: SimplePriceResponse = self.get_json(&url).await?;

        let current = CurrentPrice {
            price: Decimal::from_f64(response.bitcoin.usd).ok_or_else(|| {
                MarketDataError::InvalidData(format!("price {} not finite", response.bitcoin.usd))
            })?,
            change_24h: Decimal::from_f64(response.bitcoin.usd_24h_change).unwrap_or(Decimal::ZERO),
            market_cap: Decimal::from_f64(response.bitcoin.usd_market_cap).unwrap_or(Decimal::ZERO),
        };

        self.spot_cache.insert("spot", current);
        Ok(current)
    }
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<(i64, f64)>,
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: BitcoinEntry,
}

#[derive(Debug, Deserialize)]
struct BitcoinEntry {
    usd: f64,
    #[serde(default)]
    usd_24h_change: f64,
    #[serde(default)]
    usd_market_cap: f64,
}
