use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Spot quote for BTC/USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentPrice {
    pub price: Decimal,
    /// 24-hour change, in percent.
    pub change_24h: Decimal,
    pub market_cap: Decimal,
}

impl CurrentPrice {
    /// The value substituted when the spot quote cannot be fetched in time.
    pub fn unavailable() -> Self {
        Self {
            price: Decimal::ZERO,
            change_24h: Decimal::ZERO,
            market_cap: Decimal::ZERO,
        }
    }
}

/// One Fear & Greed Index sample (0 = extreme fear, 100 = extreme greed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FearGreedPoint {
    pub value: u8,
    pub label: String,
    pub date: NaiveDate,
}

/// Point-in-time quote for a macro instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub value: Decimal,
    pub change: Decimal,
    /// Daily change, in percent.
    pub change_percent: Decimal,
}

impl Quote {
    /// A flat quote pinned to the instrument's documented fallback level.
    pub fn fallback(value: Decimal) -> Self {
        Self {
            value,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
        }
    }
}

/// Direction of retail search interest relative to its recent baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTrend {
    Spiking,
    Cooling,
    Flat,
}

/// Summary of a retail search-interest series for one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchInterest {
    /// Mean of the most recent samples (provider-defined window).
    pub recent_average: f64,
    pub trend: SearchTrend,
    pub timeline: Vec<u32>,
}
