//! Macro instrument quotes from the Yahoo Finance public quote endpoint.

use async_trait::async_trait;
use configuration::ProviderSettings;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::MarketDataError;
use crate::{Instrument, MacroQuoteProvider};
use core_types::Quote;

const YAHOO_BASE: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// The concrete tickers behind the abstract instruments: the dollar index,
/// the 10-year treasury yield and the 30-day fed funds futures contract.
fn symbol(instrument: Instrument) -> &'static str {
    match instrument {
        Instrument::CurrencyIndex => "DX-Y.NYB",
        Instrument::LongYield => "^TNX",
        Instrument::RateFutures => "ZQ=F",
    }
}

/// A `MacroQuoteProvider` backed by Yahoo's `v7/finance/quote` endpoint.
pub struct YahooQuoteClient {
    client: reqwest::Client,
    base_url: String,
    cache: TtlCache<Quote>,
}

impl YahooQuoteClient {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build reqwest client"),
            base_url: YAHOO_BASE.to_string(),
            cache: TtlCache::new(Duration::from_secs(settings.spot_cache_ttl_secs)),
        }
    }
}

#[async_trait]
impl MacroQuoteProvider for YahooQuoteClient {
    async fn quote(&self, instrument: Instrument) -> Result<Quote, MarketDataError> {
        let symbol = symbol(instrument);
        if let Some(cached) = self.cache.get(symbol) {
            return Ok(cached);
        }

        let url = format!("{}/v7/finance/quote", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("symbols", symbol)])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(MarketDataError::Api(format!(
                "Yahoo returned {status} for {symbol}: {text}"
            )));
        }

        let parsed: QuoteEnvelope = serde_json::from_str(&text)
            .map_err(|e| MarketDataError::Deserialization(e.to_string()))?;
        let entry = parsed
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| {
                MarketDataError::InvalidData(format!("no quote returned for {symbol}"))
            })?;

        let price = entry.regular_market_price.ok_or_else(|| {
            MarketDataError::InvalidData(format!("{symbol} quote carries no market price"))
        })?;
        let quote = Quote {
            value: Decimal::from_f64(price).ok_or_else(|| {
                MarketDataError::InvalidData(format!("price {price} not finite"))
            })?,
            change: Decimal::from_f64(entry.regular_market_change.unwrap_or(0.0))
                .unwrap_or(Decimal::ZERO),
            change_percent: Decimal::from_f64(entry.regular_market_change_percent.unwrap_or(0.0))
                .unwrap_or(Decimal::ZERO),
        };

        self.cache.insert(symbol, quote);
        Ok(quote)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Vec<QuoteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEntry {
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
}
