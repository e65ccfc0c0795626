//! # Accumulation Backtester
//!
//! Replays historical daily prices against a buy schedule to produce the
//! trajectory of one of three accumulation strategies: standard DCA,
//! sentiment-adjusted smart DCA, or an equivalent-capital lump sum.
//!
//! ## Architectural Principles
//!
//! - **Abstract data only:** The simulator consumes the `PriceProvider` and
//!   `SentimentProvider` contracts; it has no knowledge of HTTP or caching.
//! - **Missing data never throws:** A day without a price or sentiment
//!   sample is skipped for buy purposes. The only genuine failure is a
//!   lump-sum run over a range with no price samples at all, which cannot
//!   establish an entry price.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use core_types::{BacktestResult, BuyEvent, ComparisonResult, DcaConfig, StrategyKind};
use market_data::{PriceProvider, SentimentProvider};

pub mod error;
pub mod schedule;

pub use error::BacktestError;
pub use schedule::should_buy;

/// Extra days of sentiment history requested beyond the simulated span, so
/// the window still covers the range when the feed lags by a few samples.
const FGI_LOOKBACK_MARGIN: i64 = 30;

/// The accumulation backtesting engine.
pub struct Backtester {
    prices: Arc<dyn PriceProvider>,
    sentiment: Arc<dyn SentimentProvider>,
}

impl Backtester {
    pub fn new(prices: Arc<dyn PriceProvider>, sentiment: Arc<dyn SentimentProvider>) -> Self {
        Self { prices, sentiment }
    }

    /// Runs a single strategy over the configured range.
    pub async fn simulate(
        &self,
        config: &DcaConfig,
        kind: StrategyKind,
    ) -> Result<BacktestResult, BacktestError> {
        config.validate()?;

        match kind {
            StrategyKind::Standard => self.run_schedule(config, false).await,
            StrategyKind::Smart => self.run_schedule(config, true).await,
            StrategyKind::LumpSum => self.run_lump_sum(config).await,
        }
    }

    /// Runs all three strategies concurrently over identical inputs.
    ///
    /// The smart leg always runs with sentiment adjustment enabled,
    /// regardless of the flag on `config`. A failure in any leg fails the
    /// whole comparison; one strategy's result must never mask another's
    /// missing data.
    pub async fn compare(&self, config: &DcaConfig) -> Result<ComparisonResult, BacktestError> {
        let mut smart_config = config.clone();
        smart_config.smart_dca = true;

        let (standard, smart, lump_sum) = tokio::try_join!(
            self.simulate(config, StrategyKind::Standard),
            self.simulate(&smart_config, StrategyKind::Smart),
            self.simulate(config, StrategyKind::LumpSum),
        )?;

        Ok(ComparisonResult {
            standard,
            smart,
            lump_sum,
        })
    }

    /// Shared replay loop for the standard and smart schedules.
    async fn run_schedule(
        &self,
        config: &DcaConfig,
        smart: bool,
    ) -> Result<BacktestResult, BacktestError> {
        let prices = self
            .prices
            .daily_prices(config.start_date, config.end_date)
            .await?;
        let price_map: BTreeMap<NaiveDate, Decimal> =
            prices.iter().map(|p| (p.date_key(), p.price)).collect();

        let fgi_map: HashMap<NaiveDate, u8> = if smart {
            let span = (config.end_date - config.start_date).num_days() + FGI_LOOKBACK_MARGIN;
            self.sentiment.daily_map(span.max(1) as u32).await?
        } else {
            HashMap::new()
        };

        let mut buys: Vec<BuyEvent> = Vec::new();
        let mut total_btc = Decimal::ZERO;
        let mut total_invested = Decimal::ZERO;

        let mut current = config.start_date;
        while current <= config.end_date {
            if let Some(&price) = price_map.get(&current) {
                if !price.is_zero() && should_buy(current, config.start_date, config.frequency) {
                    let (fgi_value, multiplier) = if smart {
                        let fgi = fgi_map.get(&current).copied();
                        let multiplier = match fgi {
                            Some(v) if v <= config.fear_threshold => config.fear_multiplier,
                            Some(v) if v >= config.greed_threshold => config.greed_multiplier,
                            _ => Decimal::ONE,
                        };
                        (fgi, Some(multiplier))
                    } else {
                        (None, None)
                    };

                    let amount = config.amount * multiplier.unwrap_or(Decimal::ONE);
                    let btc_bought = amount / price;
                    total_btc += btc_bought;
                    total_invested += amount;

                    buys.push(BuyEvent {
                        date: current,
                        price,
                        amount_usd: amount,
                        btc_bought,
                        total_btc,
                        total_invested,
                        portfolio_value: total_btc * price,
                        fgi_value,
                        multiplier,
                    });
                }
            }

            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        let strategy = if smart {
            StrategyKind::Smart
        } else {
            StrategyKind::Standard
        };
        tracing::debug!(
            %strategy,
            buys = buys.len(),
            %total_invested,
            "schedule replay complete"
        );

        let last_price = prices.last().map(|p| p.price).unwrap_or(Decimal::ZERO);
        Ok(finalize(
            strategy,
            config,
            buys,
            total_btc,
            total_invested,
            last_price,
        ))
    }

    /// Deploys the capital an equivalent standard schedule would have
    /// invested, all at the first available price in the range.
    async fn run_lump_sum(&self, config: &DcaConfig) -> Result<BacktestResult, BacktestError> {
        let prices = self
            .prices
            .daily_prices(config.start_date, config.end_date)
            .await?;
        let Some(first) = prices.first() else {
            return Err(BacktestError::NoDataInRange);
        };
        let entry_price = first.price;
        if entry_price.is_zero() {
            return Err(BacktestError::NoDataInRange);
        }

        let mut buy_count: u32 = 0;
        let mut current = config.start_date;
        while current <= config.end_date {
            if should_buy(current, config.start_date, config.frequency) {
                buy_count += 1;
            }
            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        let total_invested = Decimal::from(buy_count) * config.amount;
        let total_btc = total_invested / entry_price;

        let mut buys = vec![BuyEvent {
            date: first.date_key(),
            price: entry_price,
            amount_usd: total_invested,
            btc_bought: total_btc,
            total_btc,
            total_invested,
            portfolio_value: total_btc * entry_price,
            fgi_value: None,
            multiplier: None,
        }];

        // Synthetic zero-amount events give the trajectory the same time
        // resolution as the scheduled strategies, for drawdown purposes.
        for point in prices.iter().skip(1) {
            buys.push(BuyEvent {
                date: point.date_key(),
                price: point.price,
                amount_usd: Decimal::ZERO,
                btc_bought: Decimal::ZERO,
                total_btc,
                total_invested,
                portfolio_value: total_btc * point.price,
                fgi_value: None,
                multiplier: None,
            });
        }

        let last_price = prices.last().map(|p| p.price).unwrap_or(entry_price);
        Ok(finalize(
            StrategyKind::LumpSum,
            config,
            buys,
            total_btc,
            total_invested,
            last_price,
        ))
    }
}

/// Values the final holdings and derives the performance metrics.
fn finalize(
    strategy: StrategyKind,
    config: &DcaConfig,
    buys: Vec<BuyEvent>,
    total_btc: Decimal,
    total_invested: Decimal,
    last_price: Decimal,
) -> BacktestResult {
    let final_value = total_btc * last_price;
    let days = (config.end_date - config.start_date).num_days();

    BacktestResult {
        strategy,
        config: config.clone(),
        roi: analytics::roi(total_invested, final_value),
        annualized_return: analytics::annualized_return(total_invested, final_value, days),
        max_drawdown: analytics::max_drawdown(&buys),
        average_cost: analytics::average_cost(total_invested, total_btc),
        buys,
        total_invested,
        total_btc,
        final_value,
        current_price: last_price,
    }
}
