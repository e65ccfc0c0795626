use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::enums::{Frequency, StrategyKind};
use crate::error::CoreError;

/// A single immutable price sample. The daily lookup key is derived by
/// truncating the timestamp to day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

impl PricePoint {
    /// The calendar-day key used to align price, sentiment and buy schedules.
    pub fn date_key(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Parameters for one simulated accumulation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: Frequency,
    /// USD deployed per scheduled buy.
    pub amount: Decimal,
    #[serde(default)]
    pub smart_dca: bool,
    #[serde(default = "default_fear_threshold")]
    pub fear_threshold: u8,
    #[serde(default = "default_greed_threshold")]
    pub greed_threshold: u8,
    #[serde(default = "default_fear_multiplier")]
    pub fear_multiplier: Decimal,
    #[serde(default = "default_greed_multiplier")]
    pub greed_multiplier: Decimal,
}

fn default_fear_threshold() -> u8 {
    25
}

fn default_greed_threshold() -> u8 {
    75
}

fn default_fear_multiplier() -> Decimal {
    dec!(2.0)
}

fn default_greed_multiplier() -> Decimal {
    dec!(0.5)
}

impl DcaConfig {
    /// Checks the structural invariants of the plan before it is simulated.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.start_date > self.end_date {
            return Err(CoreError::InvalidInput(
                "start_date".to_string(),
                "start date must not be after end date".to_string(),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "amount".to_string(),
                "per-buy amount must be positive".to_string(),
            ));
        }
        if self.fear_threshold > 100 || self.greed_threshold > 100 {
            return Err(CoreError::InvalidInput(
                "thresholds".to_string(),
                "sentiment thresholds must lie in 0..=100".to_string(),
            ));
        }
        if self.fear_multiplier <= Decimal::ZERO || self.greed_multiplier <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "multipliers".to_string(),
                "buy multipliers must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One simulated purchase, with running totals up to and including this buy.
///
/// `total_btc` and `total_invested` are monotonically non-decreasing across
/// the chronologically ordered event sequence; `portfolio_value` is marked to
/// the price on the event's own date, not the final price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyEvent {
    pub date: NaiveDate,
    pub price: Decimal,
    pub amount_usd: Decimal,
    pub btc_bought: Decimal,
    pub total_btc: Decimal,
    pub total_invested: Decimal,
    pub portfolio_value: Decimal,
    /// Sentiment reading used for the buy, when one existed for the date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fgi_value: Option<u8>,
    /// The sentiment multiplier applied to the base amount, for traceability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<Decimal>,
}

/// The completed trajectory of one simulated strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy: StrategyKind,
    pub config: DcaConfig,
    pub buys: Vec<BuyEvent>,
    pub total_invested: Decimal,
    pub total_btc: Decimal,
    /// Holdings valued at the last known price sample in the fetched series.
    pub final_value: Decimal,
    pub roi: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub average_cost: Decimal,
    pub current_price: Decimal,
}

/// The three strategies simulated over identical inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub standard: BacktestResult,
    pub smart: BacktestResult,
    pub lump_sum: BacktestResult,
}
