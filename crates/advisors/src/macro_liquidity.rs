//! Global macro liquidity advisor.
//!
//! Scores the dollar-liquidity backdrop for BTC from four independent
//! indicators: the policy rate implied by short-term rate futures, a
//! long-duration bond yield, a currency-strength index, and (optionally)
//! retail search interest. Each quote degrades to a documented fallback
//! level when its feed is unreachable, and a quote sitting exactly at its
//! fallback with zero change is reported as unavailable while still
//! contributing its zero score.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::scoring::{rule, score_ladder, Cmp, Rule};
use configuration::MacroFallbacks;
use core_types::{Quote, SearchTrend};
use market_data::{
    fetch_with_fallback, Instrument, MacroQuoteProvider, SearchInterestProvider,
};

/// Keyword and window used for the retail search-interest indicator.
const SEARCH_KEYWORD: &str = "Bitcoin";
const SEARCH_WINDOW_DAYS: u32 = 30;

/// Implied-rate change in basis points. Cut pricing is the strongest
/// bullish-liquidity signal, so it carries the largest weight.
const RATE_LADDER: &[Rule] = &[
    rule(Cmp::Le, dec!(-5), -3),
    rule(Cmp::Lt, dec!(-1), -1),
    rule(Cmp::Ge, dec!(5), 3),
    rule(Cmp::Gt, dec!(1), 1),
];

/// Long-yield daily change, in percent.
const YIELD_LADDER: &[Rule] = &[
    rule(Cmp::Lt, dec!(-1.5), -2),
    rule(Cmp::Lt, dec!(-0.5), -1),
    rule(Cmp::Gt, dec!(1.5), 2),
    rule(Cmp::Gt, dec!(0.5), 1),
];

/// Currency-index daily change, in percent.
const CURRENCY_LADDER: &[Rule] = &[
    rule(Cmp::Lt, dec!(-0.5), -2),
    rule(Cmp::Lt, dec!(-0.2), -1),
    rule(Cmp::Gt, dec!(0.5), 2),
    rule(Cmp::Gt, dec!(0.2), 1),
];

/// Aggregate score at or beyond which the regime is called.
const SIGNAL_THRESHOLD: i32 = 3;

/// The liquidity regime read from the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroSignal {
    Easing,
    Tightening,
    Neutral,
}

impl MacroSignal {
    fn label(self) -> &'static str {
        match self {
            MacroSignal::Easing => "macro liquidity easing (supportive for BTC)",
            MacroSignal::Tightening => "macro liquidity tightening (headwind for BTC)",
            MacroSignal::Neutral => "macro liquidity neutral (little change)",
        }
    }
}

/// The policy rate implied by the rate-futures quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedPolicyRate {
    pub value: Decimal,
    pub change_bps: Decimal,
}

/// Retail search-interest summary carried on the analysis when available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetailInterest {
    pub recent_average: f64,
    pub trend: SearchTrend,
}

/// The advisor's complete, serializable output. The last reasoning entry is
/// always the aggregate summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAnalysis {
    pub signal: MacroSignal,
    pub signal_label: String,
    pub currency_index: Quote,
    pub long_yield: Quote,
    pub implied_policy_rate: ImpliedPolicyRate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail: Option<RetailInterest>,
    pub reasoning: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Scores macro quotes into a [`MacroAnalysis`].
pub struct MacroAdvisor {
    quotes: Arc<dyn MacroQuoteProvider>,
    search: Option<Arc<dyn SearchInterestProvider>>,
    fallbacks: MacroFallbacks,
    timeout: Duration,
}

impl MacroAdvisor {
    pub fn new(
        quotes: Arc<dyn MacroQuoteProvider>,
        search: Option<Arc<dyn SearchInterestProvider>>,
        fallbacks: MacroFallbacks,
        timeout: Duration,
    ) -> Self {
        Self {
            quotes,
            search,
            fallbacks,
            timeout,
        }
    }

    /// Fetches all indicators concurrently and independently, then scores
    /// them. Never fails; unreachable feeds degrade to their fallbacks.
    pub async fn analyze(&self) -> MacroAnalysis {
        let (currency, long_yield, futures, retail) = tokio::join!(
            fetch_with_fallback(
                "currency-index",
                self.quotes.quote(Instrument::CurrencyIndex),
                Quote::fallback(self.fallbacks.currency_index),
                self.timeout,
            ),
            fetch_with_fallback(
                "long-yield",
                self.quotes.quote(Instrument::LongYield),
                Quote::fallback(self.fallbacks.long_yield),
                self.timeout,
            ),
            fetch_with_fallback(
                "rate-futures",
                self.quotes.quote(Instrument::RateFutures),
                Quote::fallback(self.fallbacks.rate_futures),
                self.timeout,
            ),
            self.fetch_retail(),
        );

        let mut score = 0;
        let mut reasoning = Vec::new();

        // Futures price up means the implied rate (100 - price) down, i.e.
        // more cuts priced in; converted to basis points.
        let implied_rate = Decimal::ONE_HUNDRED - futures.value;
        let change_bps = -futures.change * Decimal::ONE_HUNDRED;

        if is_fallback(&futures, self.fallbacks.rate_futures) {
            reasoning.push(
                "Short-rate futures data unavailable or flat; estimating from the fallback level"
                    .to_string(),
            );
        } else {
            let contribution = score_ladder(RATE_LADDER, change_bps);
            score += contribution;
            reasoning.push(rate_reasoning(contribution, implied_rate, change_bps));
        }

        if is_fallback(&long_yield, self.fallbacks.long_yield) {
            reasoning.push(
                "Bond-yield data unavailable or flat; estimating from the fallback level"
                    .to_string(),
            );
        } else {
            let contribution = score_ladder(YIELD_LADDER, long_yield.change_percent);
            score += contribution;
            reasoning.push(yield_reasoning(contribution, &long_yield));
        }

        if is_fallback(&currency, self.fallbacks.currency_index) {
            reasoning.push(
                "Currency-index data unavailable or flat; estimating from the fallback level"
                    .to_string(),
            );
        } else {
            let contribution = score_ladder(CURRENCY_LADDER, currency.change_percent);
            score += contribution;
            reasoning.push(currency_reasoning(contribution, &currency));
        }

        if let Some(retail) = &retail {
            let contribution = retail_score(retail);
            score += contribution;
            reasoning.push(retail_reasoning(contribution, retail));
        }

        let signal = if score <= -SIGNAL_THRESHOLD {
            MacroSignal::Easing
        } else if score >= SIGNAL_THRESHOLD {
            MacroSignal::Tightening
        } else {
            MacroSignal::Neutral
        };
        reasoning.push(summary(signal));

        tracing::debug!(score, ?signal, "macro indicators scored");

        MacroAnalysis {
            signal,
            signal_label: signal.label().to_string(),
            currency_index: currency,
            long_yield,
            implied_policy_rate: ImpliedPolicyRate {
                value: implied_rate,
                change_bps,
            },
            retail,
            reasoning,
            timestamp: Utc::now(),
        }
    }

    async fn fetch_retail(&self) -> Option<RetailInterest> {
        let provider = self.search.clone()?;
        let fetched = fetch_with_fallback(
            "search-interest",
            async move {
                provider
                    .search_interest(SEARCH_KEYWORD, SEARCH_WINDOW_DAYS)
                    .await
                    .map(Some)
            },
            None,
            self.timeout,
        )
        .await;

        fetched.map(|interest| RetailInterest {
            recent_average: interest.recent_average,
            trend: interest.trend,
        })
    }
}

/// A quote pinned exactly at its fallback level with zero change is
/// indistinguishable from a failed fetch and is treated as unavailable.
fn is_fallback(quote: &Quote, fallback_value: Decimal) -> bool {
    quote.value == fallback_value && quote.change_percent.is_zero()
}

fn retail_score(retail: &RetailInterest) -> i32 {
    if retail.trend == SearchTrend::Spiking && retail.recent_average > 75.0 {
        2
    } else if retail.trend == SearchTrend::Cooling && retail.recent_average < 30.0 {
        -2
    } else {
        0
    }
}

fn rate_reasoning(contribution: i32, implied_rate: Decimal, change_bps: Decimal) -> String {
    match contribution {
        -3 => format!(
            "Rate futures imply the short rate dropping to {implied_rate:.2}% (about {:.0}bps of cuts priced in); dovish repricing this fast is a strong liquidity tailwind for BTC",
            change_bps.abs()
        ),
        -1 => format!(
            "Rate futures imply the short rate easing slightly to {implied_rate:.2}%; front-end funding conditions loosening at the margin"
        ),
        3 => format!(
            "Rate futures imply the short rate rising to {implied_rate:.2}% (about {change_bps:.0}bps priced in); cut expectations are being unwound, a significant drain on liquidity"
        ),
        1 => format!(
            "Rate futures imply the short rate nudging up to {implied_rate:.2}%; front-end funding conditions tightening at the margin"
        ),
        _ => format!(
            "Rate futures hold the implied short rate steady at {implied_rate:.2}%; near-term policy expectations are stable"
        ),
    }
}

fn yield_reasoning(contribution: i32, quote: &Quote) -> String {
    match contribution {
        -2 => format!(
            "The long-end yield fell sharply to {:.2}% ({:.2}% on the day); borrowing costs materially lower and risk-free paper less attractive",
            quote.value,
            quote.change_percent.abs()
        ),
        -1 => format!(
            "The long-end yield drifted down to {:.2}%; medium-term funding conditions improving at the margin",
            quote.value
        ),
        2 => format!(
            "The long-end yield surged to {:.2}% (up {:.2}% on the day); a strong risk-free bid pulls capital away from crypto",
            quote.value, quote.change_percent
        ),
        1 => format!(
            "The long-end yield rose to {:.2}%; medium-term borrowing costs tightening at the margin",
            quote.value
        ),
        _ => format!(
            "The long-end yield is holding at {:.2}%; the bond market is waiting for direction",
            quote.value
        ),
    }
}

fn currency_reasoning(contribution: i32, quote: &Quote) -> String {
    match contribution {
        -2 => format!(
            "The dollar index slid to {:.2} (down {:.2}% on the day); a weaker dollar releases global liquidity and flatters hard assets",
            quote.value,
            quote.change_percent.abs()
        ),
        -1 => format!(
            "The dollar index eased to {:.2}; a mild liquidity release on the currency side",
            quote.value
        ),
        2 => format!(
            "The dollar index jumped to {:.2} (up {:.2}% on the day); safe-haven demand or repatriation flows pressure crypto liquidity hard",
            quote.value, quote.change_percent
        ),
        1 => format!(
            "The dollar index firmed to {:.2}; rising dollar purchasing power weighs on BTC pricing",
            quote.value
        ),
        _ => format!(
            "The dollar index is flat at {:.2}; no clear macro direction from the currency market",
            quote.value
        ),
    }
}

fn retail_reasoning(contribution: i32, retail: &RetailInterest) -> String {
    match contribution {
        2 => format!(
            "Retail search interest is spiking at a high level ({:.0}); crowd froth of this kind often marks local tops",
            retail.recent_average
        ),
        -2 => format!(
            "Retail search interest has cooled to apathy ({:.0}); disinterest has historically accompanied bottoms",
            retail.recent_average
        ),
        _ => format!(
            "Retail search interest is unremarkable ({:.0}); no crowd signal either way",
            retail.recent_average
        ),
    }
}

fn summary(signal: MacroSignal) -> String {
    match signal {
        MacroSignal::Easing => {
            "Overall: cut pricing at the front end plus a softer long end and dollar are opening the liquidity taps; BTC enjoys a favorable macro tailwind"
                .to_string()
        }
        MacroSignal::Tightening => {
            "Overall: rising rate expectations and a firmer long end are draining liquidity; risk-free yield is absorbing capital and BTC faces a macro headwind"
                .to_string()
        }
        MacroSignal::Neutral => {
            "Overall: macro indicators are mixed or little changed; liquidity sits in a neutral band and price will follow crypto-native flows"
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticQuotes;
    use core_types::SearchInterest;
    use std::collections::HashMap;

    fn quote(value: Decimal, change: Decimal, change_percent: Decimal) -> Quote {
        Quote {
            value,
            change,
            change_percent,
        }
    }

    fn advisor_with(
        quotes: HashMap<Instrument, Quote>,
        search: Option<Arc<dyn SearchInterestProvider>>,
    ) -> MacroAdvisor {
        MacroAdvisor::new(
            Arc::new(StaticQuotes(quotes)),
            search,
            MacroFallbacks::default(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn lone_yield_spike_stays_neutral() {
        let mut quotes = HashMap::new();
        // Currency pinned at its fallback with zero change; futures flat at
        // fallback too; only the yield moves, +2.0% on the day.
        quotes.insert(Instrument::CurrencyIndex, quote(dec!(104.0), dec!(0), dec!(0)));
        quotes.insert(Instrument::LongYield, quote(dec!(4.5), dec!(0.09), dec!(2.0)));
        quotes.insert(Instrument::RateFutures, quote(dec!(95.38), dec!(0), dec!(0)));

        let analysis = advisor_with(quotes, None).analyze().await;

        // Score +2 from the yield alone stays below the +/-3 threshold.
        assert_eq!(analysis.signal, MacroSignal::Neutral);
        assert!(analysis.reasoning[0].contains("fallback"));
        assert!(analysis.reasoning[2].contains("fallback"));
        // Summary always comes last.
        assert!(analysis.reasoning.last().unwrap().starts_with("Overall:"));
    }

    #[tokio::test]
    async fn cut_pricing_and_soft_yield_read_as_easing() {
        let mut quotes = HashMap::new();
        // Futures +0.06 -> implied rate down 6bps: -3.
        quotes.insert(Instrument::RateFutures, quote(dec!(95.44), dec!(0.06), dec!(0.06)));
        // Yield down 1.6% on the day: -2.
        quotes.insert(Instrument::LongYield, quote(dec!(4.1), dec!(-0.07), dec!(-1.6)));
        // Currency drifting, within the dead band.
        quotes.insert(Instrument::CurrencyIndex, quote(dec!(103.9), dec!(-0.1), dec!(-0.1)));

        let analysis = advisor_with(quotes, None).analyze().await;

        assert_eq!(analysis.signal, MacroSignal::Easing);
        assert_eq!(analysis.implied_policy_rate.value, dec!(4.56));
        assert_eq!(analysis.implied_policy_rate.change_bps, dec!(-6.00));
        assert!(analysis.retail.is_none());
    }

    #[tokio::test]
    async fn unwound_cuts_and_strong_dollar_read_as_tightening() {
        let mut quotes = HashMap::new();
        // Futures -0.06 -> implied rate up 6bps: +3.
        quotes.insert(Instrument::RateFutures, quote(dec!(95.32), dec!(-0.06), dec!(-0.06)));
        quotes.insert(Instrument::LongYield, quote(dec!(4.3), dec!(0.02), dec!(0.4)));
        // Dollar up 0.6%: +2.
        quotes.insert(Instrument::CurrencyIndex, quote(dec!(105.1), dec!(0.63), dec!(0.6)));

        let analysis = advisor_with(quotes, None).analyze().await;
        assert_eq!(analysis.signal, MacroSignal::Tightening);
    }

    #[tokio::test]
    async fn unreachable_feeds_degrade_to_neutral_fallbacks() {
        // No instruments configured at all: every quote falls back.
        let analysis = advisor_with(HashMap::new(), None).analyze().await;

        assert_eq!(analysis.signal, MacroSignal::Neutral);
        assert_eq!(analysis.currency_index.value, dec!(104.0));
        assert_eq!(analysis.long_yield.value, dec!(4.2));
        assert_eq!(analysis.implied_policy_rate.value, dec!(4.62));
        // Three unavailability notes plus the summary.
        assert_eq!(analysis.reasoning.len(), 4);
    }

    #[tokio::test]
    async fn spiking_retail_interest_adds_to_tightening() {
        use crate::test_support::StaticSearch;

        let mut quotes = HashMap::new();
        // Dollar up 0.3%: +1.
        quotes.insert(Instrument::CurrencyIndex, quote(dec!(104.5), dec!(0.3), dec!(0.3)));
        quotes.insert(Instrument::LongYield, quote(dec!(4.2), dec!(0), dec!(0.1)));
        quotes.insert(Instrument::RateFutures, quote(dec!(95.38), dec!(0), dec!(0.01)));

        let search = StaticSearch(SearchInterest {
            recent_average: 88.0,
            trend: SearchTrend::Spiking,
            timeline: vec![],
        });
        let analysis = advisor_with(quotes, Some(Arc::new(search))).analyze().await;

        // +1 currency +2 retail reaches the tightening threshold.
        assert_eq!(analysis.signal, MacroSignal::Tightening);
        let retail = analysis.retail.unwrap();
        assert_eq!(retail.trend, SearchTrend::Spiking);
    }

    #[test]
    fn retail_scoring_requires_both_trend_and_level() {
        let spiking_low = RetailInterest {
            recent_average: 40.0,
            trend: SearchTrend::Spiking,
        };
        assert_eq!(retail_score(&spiking_low), 0);

        let cooling_low = RetailInterest {
            recent_average: 12.0,
            trend: SearchTrend::Cooling,
        };
        assert_eq!(retail_score(&cooling_low), -2);

        let flat = RetailInterest {
            recent_average: 90.0,
            trend: SearchTrend::Flat,
        };
        assert_eq!(retail_score(&flat), 0);
    }
}
