//! Deterministic provider fixtures shared by the advisor test modules.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::collections::HashMap;

use core_types::{CurrentPrice, FearGreedPoint, PricePoint, Quote, SearchInterest};
use market_data::{
    Instrument, MacroQuoteProvider, MarketDataError, PriceProvider, SearchInterestProvider,
    SentimentProvider,
};

pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn sample(date: NaiveDate, price: Decimal) -> PricePoint {
    PricePoint {
        timestamp: date.and_time(NaiveTime::MIN).and_utc(),
        price,
    }
}

/// A price provider serving a fixed series and spot quote.
pub(crate) struct StaticPrices {
    pub series: Vec<PricePoint>,
    pub spot: CurrentPrice,
}

#[async_trait]
impl PriceProvider for StaticPrices {
    async fn daily_prices(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        Ok(self
            .series
            .iter()
            .filter(|p| p.date_key() >= start && p.date_key() <= end)
            .cloned()
            .collect())
    }

    async fn current_price(&self) -> Result<CurrentPrice, MarketDataError> {
        Ok(self.spot)
    }
}

/// A sentiment provider serving a fixed, newest-first history.
pub(crate) struct StaticSentiment(pub Vec<FearGreedPoint>);

#[async_trait]
impl SentimentProvider for StaticSentiment {
    async fn current(&self) -> Result<FearGreedPoint, MarketDataError> {
        self.0
            .first()
            .cloned()
            .ok_or_else(|| MarketDataError::InvalidData("no sentiment samples".to_string()))
    }

    async fn history(&self, days: u32) -> Result<Vec<FearGreedPoint>, MarketDataError> {
        Ok(self.0.iter().take(days as usize).cloned().collect())
    }
}

/// A sentiment provider that always fails, for degradation tests.
pub(crate) struct FailingSentiment;

#[async_trait]
impl SentimentProvider for FailingSentiment {
    async fn current(&self) -> Result<FearGreedPoint, MarketDataError> {
        Err(MarketDataError::Api("sentiment feed down".to_string()))
    }

    async fn history(&self, _days: u32) -> Result<Vec<FearGreedPoint>, MarketDataError> {
        Err(MarketDataError::Api("sentiment feed down".to_string()))
    }
}

/// A price provider that always fails, for degradation tests.
pub(crate) struct FailingPrices;

#[async_trait]
impl PriceProvider for FailingPrices {
    async fn daily_prices(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        Err(MarketDataError::Api("price feed down".to_string()))
    }

    async fn current_price(&self) -> Result<CurrentPrice, MarketDataError> {
        Err(MarketDataError::Api("price feed down".to_string()))
    }
}

/// A macro-quote provider serving fixed quotes; unlisted instruments fail.
pub(crate) struct StaticQuotes(pub HashMap<Instrument, Quote>);

#[async_trait]
impl MacroQuoteProvider for StaticQuotes {
    async fn quote(&self, instrument: Instrument) -> Result<Quote, MarketDataError> {
        self.0
            .get(&instrument)
            .copied()
            .ok_or_else(|| MarketDataError::Api("quote feed down".to_string()))
    }
}

/// A search-interest provider serving one fixed summary.
pub(crate) struct StaticSearch(pub SearchInterest);

#[async_trait]
impl SearchInterestProvider for StaticSearch {
    async fn search_interest(
        &self,
        _keyword: &str,
        _window_days: u32,
    ) -> Result<SearchInterest, MarketDataError> {
        Ok(self.0.clone())
    }
}
