//! The Ahr999 valuation index.
//!
//! Combines a trend-following term (price over the 200-day moving average)
//! with a fundamental term (price over an exponential growth-model fair
//! value) to classify the market into accumulation zones.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use core_types::CurrentPrice;
use market_data::{fetch_with_fallback, MarketDataError, PriceProvider};

/// The genesis block date anchoring the coin-age calculation.
const GENESIS: NaiveDate = match NaiveDate::from_ymd_opt(2009, 1, 3) {
    Some(date) => date,
    None => panic!("invalid genesis date"),
};

/// Samples in the moving-average window.
const MA_WINDOW: usize = 200;

/// Days of history requested; a margin over the window absorbs gaps.
const LOOKBACK_DAYS: u64 = 210;

/// Zone boundaries: below [`BOTTOM_BOUND`] is the accumulation zone, at or
/// above [`WAIT_BOUND`] the wait zone, regular DCA in between.
const BOTTOM_BOUND: f64 = 0.45;
const WAIT_BOUND: f64 = 1.2;

/// Market zone derived from the index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuationZone {
    Bottom,
    Dca,
    Wait,
}

impl ValuationZone {
    fn label(self) -> &'static str {
        match self {
            ValuationZone::Bottom => "accumulation zone (strong buy)",
            ValuationZone::Dca => "regular DCA zone",
            ValuationZone::Wait => "wait zone (reduce buying)",
        }
    }
}

/// The computed index and its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ahr999Data {
    pub value: f64,
    pub zone: ValuationZone,
    pub zone_label: String,
    pub price: Decimal,
    pub ma200: Decimal,
    pub expected_price: f64,
    pub coin_age_days: i64,
    pub timestamp: DateTime<Utc>,
}

/// Computes the Ahr999 index from live price data.
pub struct Ahr999Calculator {
    prices: Arc<dyn PriceProvider>,
    timeout: Duration,
}

impl Ahr999Calculator {
    pub fn new(prices: Arc<dyn PriceProvider>, timeout: Duration) -> Self {
        Self { prices, timeout }
    }

    /// Fetches the spot price and the moving average concurrently, each
    /// guarded by a timeout and fallback. When either input degrades to
    /// zero, an "unavailable" sentinel with value 0 is reported instead of
    /// dividing by zero.
    pub async fn calculate(&self) -> Ahr999Data {
        self.calculate_at(Utc::now()).await
    }

    async fn calculate_at(&self, now: DateTime<Utc>) -> Ahr999Data {
        let (spot, ma200) = tokio::join!(
            fetch_with_fallback(
                "spot-price",
                self.prices.current_price(),
                CurrentPrice::unavailable(),
                self.timeout,
            ),
            fetch_with_fallback(
                "moving-average",
                self.moving_average(now),
                Decimal::ZERO,
                self.timeout,
            ),
        );

        let coin_age_days = (now.date_naive() - GENESIS).num_days();
        let expected = expected_price(coin_age_days);
        let price = spot.price;

        if price.is_zero() || ma200.is_zero() {
            return Ahr999Data {
                value: 0.0,
                zone: ValuationZone::Dca,
                zone_label: "data unavailable".to_string(),
                price: Decimal::ZERO,
                ma200: Decimal::ZERO,
                expected_price: expected.round(),
                coin_age_days,
                timestamp: now,
            };
        }

        let price_f = price.to_f64().unwrap_or(0.0);
        let ma_f = ma200.to_f64().unwrap_or(0.0);
        let raw = if ma_f > 0.0 && expected > 0.0 {
            (price_f / ma_f) * (price_f / expected)
        } else {
            0.0
        };
        let value = (raw * 1000.0).round() / 1000.0;
        let zone = classify(value);

        Ahr999Data {
            value,
            zone,
            zone_label: zone.label().to_string(),
            price,
            ma200: ma200.round(),
            expected_price: expected.round(),
            coin_age_days,
            timestamp: now,
        }
    }

    /// Mean of the most recent [`MA_WINDOW`] daily samples, or of whatever
    /// exists when fewer are available. An empty series yields zero, which
    /// the caller reports as unavailable.
    async fn moving_average(&self, now: DateTime<Utc>) -> Result<Decimal, MarketDataError> {
        let end = now.date_naive();
        let start = end - Days::new(LOOKBACK_DAYS);
        let prices = self.prices.daily_prices(start, end).await?;

        if prices.is_empty() {
            return Ok(Decimal::ZERO);
        }

        let window = if prices.len() > MA_WINDOW {
            &prices[prices.len() - MA_WINDOW..]
        } else {
            &prices[..]
        };
        let sum: Decimal = window.iter().map(|p| p.price).sum();
        Ok(sum / Decimal::from(window.len() as u64))
    }
}

/// The exponential growth fair-value model.
fn expected_price(coin_age_days: i64) -> f64 {
    if coin_age_days <= 0 {
        return 0.0;
    }
    10f64.powf(5.84 * (coin_age_days as f64).log10() - 17.01)
}

fn classify(value: f64) -> ValuationZone {
    if value < BOTTOM_BOUND {
        ValuationZone::Bottom
    } else if value < WAIT_BOUND {
        ValuationZone::Dca
    } else {
        ValuationZone::Wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, sample, FailingPrices, StaticPrices};
    use chrono::NaiveTime;
    use rust_decimal_macros::dec;

    #[test]
    fn zone_boundaries_are_half_open() {
        assert_eq!(classify(0.449), ValuationZone::Bottom);
        assert_eq!(classify(0.45), ValuationZone::Dca);
        assert_eq!(classify(1.199), ValuationZone::Dca);
        assert_eq!(classify(1.2), ValuationZone::Wait);
    }

    #[test]
    fn fair_value_grows_with_coin_age() {
        let early = expected_price(1000);
        let late = expected_price(5000);
        assert!(late > early);
        // Around five thousand days the model sits in the tens of thousands.
        assert!(late > 10_000.0 && late < 100_000.0);
        assert_eq!(expected_price(0), 0.0);
    }

    #[tokio::test]
    async fn computes_index_from_spot_and_average() {
        let now = day(2024, 6, 1).and_time(NaiveTime::MIN).and_utc();
        // 300 days of history at a constant 50k; the window trims to 200.
        let series: Vec<_> = (0..300u64)
            .map(|i| sample(day(2024, 6, 1) - Days::new(i), dec!(50000)))
            .collect();
        let calculator = Ahr999Calculator::new(
            Arc::new(StaticPrices {
                series,
                spot: CurrentPrice {
                    price: dec!(50000),
                    change_24h: Decimal::ZERO,
                    market_cap: Decimal::ZERO,
                },
            }),
            Duration::from_millis(200),
        );

        let data = calculator.calculate_at(now).await;

        assert_eq!(data.ma200, dec!(50000));
        let age = (day(2024, 6, 1) - GENESIS).num_days();
        assert_eq!(data.coin_age_days, age);

        // Trend term is exactly 1, so the index is price over fair value.
        let expected_value = 50000.0 / expected_price(age);
        assert!((data.value - (expected_value * 1000.0).round() / 1000.0).abs() < 1e-9);
        assert_eq!(data.zone, classify(data.value));
    }

    #[tokio::test]
    async fn short_history_averages_what_exists() {
        let now = day(2024, 6, 1).and_time(NaiveTime::MIN).and_utc();
        let series = vec![
            sample(day(2024, 5, 30), dec!(40000)),
            sample(day(2024, 5, 31), dec!(60000)),
        ];
        let calculator = Ahr999Calculator::new(
            Arc::new(StaticPrices {
                series,
                spot: CurrentPrice {
                    price: dec!(50000),
                    change_24h: Decimal::ZERO,
                    market_cap: Decimal::ZERO,
                },
            }),
            Duration::from_millis(200),
        );

        let data = calculator.calculate_at(now).await;
        assert_eq!(data.ma200, dec!(50000));
    }

    #[tokio::test]
    async fn degraded_inputs_yield_unavailable_sentinel() {
        let calculator =
            Ahr999Calculator::new(Arc::new(FailingPrices), Duration::from_millis(50));

        let data = calculator.calculate().await;
        assert_eq!(data.value, 0.0);
        assert_eq!(data.zone, ValuationZone::Dca);
        assert_eq!(data.zone_label, "data unavailable");
        assert_eq!(data.price, Decimal::ZERO);
        assert!(data.coin_age_days > 5000);
    }
}
