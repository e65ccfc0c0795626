//! Fear & Greed Index samples from the alternative.me public API.

use async_trait::async_trait;
use chrono::DateTime;
use configuration::ProviderSettings;
use serde::Deserialize;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::MarketDataError;
use crate::SentimentProvider;
use core_types::FearGreedPoint;

const FGI_BASE: &str = "https://api.alternative.me/fng";

/// A `SentimentProvider` backed by alternative.me's `/fng` endpoint.
pub struct AlternativeMeClient {
    client: reqwest::Client,
    base_url: String,
    cache: TtlCache<Vec<FearGreedPoint>>,
}

impl AlternativeMeClient {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: FGI_BASE.to_string(),
            cache: TtlCache::new(Duration::from_secs(settings.history_cache_ttl_secs)),
        }
    }
}

#[async_trait]
impl SentimentProvider for AlternativeMeClient {
    async fn current(&self) -> Result<FearGreedPoint, MarketDataError> {
        let mut history = self.history(1).await?;
        if history.is_empty() {
            return Err(MarketDataError::InvalidData(
                "fear & greed feed returned no samples".to_string(),
            ));
        }
        Ok(history.swap_remove(0))
    }

    async fn history(&self, days: u32) -> Result<Vec<FearGreedPoint>, MarketDataError> {
        let cache_key = format!("history:{days}");
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        let url = format!("{}/?limit={days}&format=json", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(MarketDataError::Api(format!(
                "alternative.me returned {status}: {text}"
            )));
        }

        let parsed: FngResponse = serde_json::from_str(&text)
            .map_err(|e| MarketDataError::Deserialization(e.to_string()))?;

        // The feed serializes numbers as strings; newest sample comes first.
        let mut points = Vec::with_capacity(parsed.data.len());
        for entry in parsed.data {
            let value: u8 = entry.value.parse().map_err(|_| {
                MarketDataError::InvalidData(format!("non-numeric index value '{}'", entry.value))
            })?;
            let seconds: i64 = entry.timestamp.parse().map_err(|_| {
                MarketDataError::InvalidData(format!("bad timestamp '{}'", entry.timestamp))
            })?;
            let date = DateTime::from_timestamp(seconds, 0)
                .ok_or_else(|| {
                    MarketDataError::InvalidData(format!("timestamp {seconds} out of range"))
                })?
                .date_naive();
            points.push(FearGreedPoint {
                value,
                label: entry.value_classification,
                date,
            });
        }

        self.cache.insert(cache_key, points.clone());
        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    value: String,
    value_classification: String,
    timestamp: String,
}
