//! # Market Data Providers
//!
//! This crate is the only boundary between the engine and the outside world.
//! It defines the abstract provider contracts the simulation and advisory
//! crates consume, plus concrete clients for the public data APIs.
//!
//! ## Architectural Principles
//!
//! - **Traits at the seam:** The engine depends on `PriceProvider`,
//!   `SentimentProvider`, `MacroQuoteProvider` and `SearchInterestProvider`,
//!   never on a concrete client, so tests can substitute deterministic
//!   fixtures behind an `Arc<dyn …>`.
//! - **Explicit caching:** Response memoization is an injected [`TtlCache`]
//!   owned by each client, never a hidden module-level global. Entries are
//!   evicted lazily on the next read.
//! - **Degrade, don't fail:** Advisory callers wrap provider calls in
//!   [`fetch_with_fallback`], which substitutes a documented fallback value
//!   on timeout or error instead of propagating the failure.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use core_types::{CurrentPrice, FearGreedPoint, PricePoint, Quote, SearchInterest};

// Declare all the modules that constitute this crate.
pub mod cache;
pub mod coingecko;
pub mod error;
pub mod fallback;
pub mod fear_greed;
pub mod trends;
pub mod yahoo;

// Re-export the key components to create a clean, public-facing API.
pub use cache::TtlCache;
pub use coingecko::CoinGeckoClient;
pub use error::MarketDataError;
pub use fallback::fetch_with_fallback;
pub use fear_greed::AlternativeMeClient;
pub use trends::GoogleTrendsClient;
pub use yahoo::YahooQuoteClient;

/// The macro instruments the liquidity advisor scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    /// A currency-strength index (dollar index).
    CurrencyIndex,
    /// A long-duration government bond yield.
    LongYield,
    /// A short-term rate-futures contract; `100 − price` implies the policy rate.
    RateFutures,
}

/// Daily BTC/USD price history and the current spot quote.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// One sample per calendar day in `start..=end`, ascending. Days the
    /// upstream source has no data for are simply absent.
    async fn daily_prices(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, MarketDataError>;

    async fn current_price(&self) -> Result<CurrentPrice, MarketDataError>;
}

/// Fear & Greed Index samples, current and historical.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn current(&self) -> Result<FearGreedPoint, MarketDataError>;

    /// The most recent `days` samples, newest first.
    async fn history(&self, days: u32) -> Result<Vec<FearGreedPoint>, MarketDataError>;

    /// A date-indexed view of `history`, for fast lookups during backtesting.
    async fn daily_map(&self, days: u32) -> Result<HashMap<NaiveDate, u8>, MarketDataError> {
        let history = self.history(days).await?;
        Ok(history.into_iter().map(|p| (p.date, p.value)).collect())
    }
}

/// Point-in-time quotes for macro instruments.
#[async_trait]
pub trait MacroQuoteProvider: Send + Sync {
    async fn quote(&self, instrument: Instrument) -> Result<Quote, MarketDataError>;
}

/// Retail search-interest series for a keyword, summarized provider-side.
#[async_trait]
pub trait SearchInterestProvider: Send + Sync {
    async fn search_interest(
        &self,
        keyword: &str,
        window_days: u32,
    ) -> Result<SearchInterest, MarketDataError>;
}
