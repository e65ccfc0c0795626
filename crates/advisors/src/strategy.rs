//! Sentiment-driven strategy advisor.
//!
//! Condenses the current Fear & Greed reading, its 7-day trend and the 24h
//! price move into a discrete signal plus a recommended smart-DCA parameter
//! set.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::scoring::{rule, score_ladder, Cmp, Rule};
use core_types::{CurrentPrice, FearGreedPoint, Frequency};
use market_data::{fetch_with_fallback, PriceProvider, SentimentProvider};

/// Number of sentiment samples in the trend window.
const TREND_WINDOW: usize = 7;

/// Base score contributed by the current sentiment reading.
/// Negative pulls toward buying, positive toward reducing.
const FGI_BASE_LADDER: &[Rule] = &[
    rule(Cmp::Le, dec!(20), -40),
    rule(Cmp::Le, dec!(35), -25),
    rule(Cmp::Le, dec!(45), -10),
    rule(Cmp::Le, dec!(55), 0),
    rule(Cmp::Le, dec!(70), 10),
    rule(Cmp::Le, dec!(80), 25),
    rule(Cmp::Gt, dec!(80), 40),
];

/// Modifier contributed by the 24h price move, in percent.
const PRICE_MOMENTUM_LADDER: &[Rule] = &[
    rule(Cmp::Le, dec!(-10), -15),
    rule(Cmp::Le, dec!(-5), -8),
    rule(Cmp::Ge, dec!(10), 10),
];

/// The discrete advice grades, from aggressive accumulation to standing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSignal {
    StrongBuy,
    Buy,
    Neutral,
    Reduce,
    StrongReduce,
}

impl AdviceSignal {
    fn label(self) -> &'static str {
        match self {
            AdviceSignal::StrongBuy => "strong buy",
            AdviceSignal::Buy => "add to position",
            AdviceSignal::Neutral => "regular DCA",
            AdviceSignal::Reduce => "reduce buying",
            AdviceSignal::StrongReduce => "pause buying",
        }
    }
}

/// Direction of the sentiment index over the trend window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FgiTrend {
    Falling,
    Rising,
    Stable,
}

/// Sentiment block of a [`MarketAnalysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FgiSnapshot {
    pub value: u8,
    pub label: String,
    pub trend: FgiTrend,
    pub avg_7d: u8,
}

/// Price block of a [`MarketAnalysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BtcSnapshot {
    pub price: Decimal,
    pub change_24h: Decimal,
}

/// The smart-DCA parameter set recommended for the current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub frequency: Frequency,
    pub fear_threshold: u8,
    pub greed_threshold: u8,
    pub fear_multiplier: Decimal,
    pub greed_multiplier: Decimal,
    pub reasoning: Vec<String>,
}

/// The advisor's complete, serializable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub signal: AdviceSignal,
    pub signal_label: String,
    pub fgi: FgiSnapshot,
    pub btc: BtcSnapshot,
    pub suggestion: Suggestion,
    /// 0..=95; grows with the magnitude of the composite score.
    pub confidence: u8,
    pub timestamp: DateTime<Utc>,
}

/// Scores current market conditions into a [`MarketAnalysis`].
pub struct StrategyAdvisor {
    prices: Arc<dyn PriceProvider>,
    sentiment: Arc<dyn SentimentProvider>,
    timeout: Duration,
}

impl StrategyAdvisor {
    pub fn new(
        prices: Arc<dyn PriceProvider>,
        sentiment: Arc<dyn SentimentProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            prices,
            sentiment,
            timeout,
        }
    }

    /// Pulls spot price, current sentiment and the trend window, each
    /// independently guarded by a timeout and fallback, and scores them.
    ///
    /// Never fails: when every source degrades at once, a zero-confidence
    /// "unavailable" analysis is returned instead.
    pub async fn analyze(&self) -> MarketAnalysis {
        let neutral_today = FearGreedPoint {
            value: 50,
            label: "Neutral".to_string(),
            date: Utc::now().date_naive(),
        };

        let (btc, fgi_current, fgi_history) = tokio::join!(
            fetch_with_fallback(
                "spot-price",
                self.prices.current_price(),
                CurrentPrice::unavailable(),
                self.timeout,
            ),
            fetch_with_fallback(
                "fear-greed-current",
                self.sentiment.current(),
                neutral_today,
                self.timeout,
            ),
            fetch_with_fallback(
                "fear-greed-history",
                self.sentiment.history(TREND_WINDOW as u32),
                Vec::new(),
                self.timeout,
            ),
        );

        // Every source degraded at once: report unavailability instead of a
        // confidently neutral reading built from nothing.
        if btc.price.is_zero() && fgi_current.value == 50 && fgi_history.is_empty() {
            return Self::unavailable();
        }

        let window: Vec<FearGreedPoint> = if fgi_history.is_empty() {
            vec![fgi_current.clone()]
        } else {
            fgi_history
        };
        let (trend, avg_7d) = compute_trend(&window);
        let (signal, confidence) = score_signal(fgi_current.value, trend, btc.change_24h);
        let suggestion = build_suggestion(signal, fgi_current.value, trend, btc.change_24h);

        tracing::debug!(?signal, confidence, fgi = fgi_current.value, "market conditions scored");

        MarketAnalysis {
            signal,
            signal_label: signal.label().to_string(),
            fgi: FgiSnapshot {
                value: fgi_current.value,
                label: fgi_current.label,
                trend,
                avg_7d,
            },
            btc: BtcSnapshot {
                price: btc.price,
                change_24h: btc.change_24h,
            },
            suggestion,
            confidence,
            timestamp: Utc::now(),
        }
    }

    fn unavailable() -> MarketAnalysis {
        MarketAnalysis {
            signal: AdviceSignal::Neutral,
            signal_label: "data unavailable".to_string(),
            fgi: FgiSnapshot {
                value: 0,
                label: "Unknown".to_string(),
                trend: FgiTrend::Stable,
                avg_7d: 0,
            },
            btc: BtcSnapshot {
                price: Decimal::ZERO,
                change_24h: Decimal::ZERO,
            },
            suggestion: Suggestion {
                frequency: Frequency::Weekly,
                fear_threshold: 25,
                greed_threshold: 75,
                fear_multiplier: dec!(2.0),
                greed_multiplier: dec!(0.5),
                reasoning: vec![
                    "Market data could not be fetched; keep the default DCA schedule".to_string(),
                    "Check connectivity and try again".to_string(),
                ],
            },
            confidence: 0,
            timestamp: Utc::now(),
        }
    }
}

/// Splits the newest-first window into halves and compares their means.
/// Also reports the window's rounded average.
fn compute_trend(history: &[FearGreedPoint]) -> (FgiTrend, u8) {
    fn mean(points: &[FearGreedPoint]) -> f64 {
        points.iter().map(|p| f64::from(p.value)).sum::<f64>() / points.len() as f64
    }

    if history.len() < 2 {
        let only = history.first().map(|p| p.value).unwrap_or(50);
        return (FgiTrend::Stable, only);
    }

    let recent = &history[..history.len().min(TREND_WINDOW)];
    let avg = mean(recent).round() as u8;

    let split = recent.len().div_ceil(2);
    let diff = mean(&recent[..split]) - mean(&recent[split..]);

    let trend = if diff < -5.0 {
        FgiTrend::Rising
    } else if diff > 5.0 {
        FgiTrend::Falling
    } else {
        FgiTrend::Stable
    };
    (trend, avg)
}

/// Combines the three score components and maps the total onto a signal.
fn score_signal(fgi: u8, trend: FgiTrend, change_24h: Decimal) -> (AdviceSignal, u8) {
    let mut score = score_ladder(FGI_BASE_LADDER, Decimal::from(fgi));

    score += match trend {
        FgiTrend::Falling => -10,
        FgiTrend::Rising => 10,
        FgiTrend::Stable => 0,
    };
    score += score_ladder(PRICE_MOMENTUM_LADDER, change_24h);

    let signal = if score <= -30 {
        AdviceSignal::StrongBuy
    } else if score <= -10 {
        AdviceSignal::Buy
    } else if score <= 10 {
        AdviceSignal::Neutral
    } else if score <= 30 {
        AdviceSignal::Reduce
    } else {
        AdviceSignal::StrongReduce
    };

    let confidence = (50 + score.unsigned_abs()).min(95) as u8;
    (signal, confidence)
}

/// Maps each signal onto its fixed parameter preset, with reasoning strings
/// reflecting the observed sentiment, trend and price move.
fn build_suggestion(
    signal: AdviceSignal,
    fgi: u8,
    trend: FgiTrend,
    change_24h: Decimal,
) -> Suggestion {
    let mut reasoning = Vec::new();

    let (frequency, fear_threshold, greed_threshold, fear_multiplier, greed_multiplier) =
        match signal {
            AdviceSignal::StrongBuy => (Frequency::Daily, 30, 75, dec!(3.0), dec!(0.5)),
            AdviceSignal::Buy => (Frequency::Weekly, 25, 75, dec!(2.0), dec!(0.5)),
            AdviceSignal::Neutral => (Frequency::Weekly, 25, 75, dec!(2.0), dec!(0.5)),
            AdviceSignal::Reduce => (Frequency::Biweekly, 25, 70, dec!(1.5), dec!(0.3)),
            AdviceSignal::StrongReduce => (Frequency::Monthly, 25, 65, dec!(1.0), dec!(0.2)),
        };

    match signal {
        AdviceSignal::StrongBuy => {
            reasoning.push(format!(
                "Fear & Greed Index at just {fgi}: the market is in extreme fear"
            ));
            reasoning.push(
                "Raising the schedule to daily and the fear multiplier to 3x".to_string(),
            );
            if change_24h <= dec!(-5) {
                reasoning.push(format!(
                    "BTC is down {:.1}% over 24h; panic of this kind has historically been a good entry",
                    change_24h.abs()
                ));
            }
        }
        AdviceSignal::Buy => {
            reasoning.push(format!("FGI {fgi}: the market sits in the fear band"));
            reasoning.push("Keeping the weekly schedule with a 2x fear multiplier".to_string());
            if trend == FgiTrend::Falling {
                reasoning.push(
                    "FGI has kept falling over the past 7 days; deepening fear favors adding a little more"
                        .to_string(),
                );
            }
        }
        AdviceSignal::Neutral => {
            reasoning.push(format!("FGI {fgi}: sentiment is neutral"));
            reasoning.push("Keep the default DCA plan; no adjustment needed".to_string());
        }
        AdviceSignal::Reduce => {
            reasoning.push(format!("FGI {fgi}: the market leans greedy"));
            reasoning.push(
                "Dropping the schedule to biweekly and the greed multiplier to 0.3x".to_string(),
            );
            if trend == FgiTrend::Rising {
                reasoning
                    .push("The FGI trend is rising; greed may intensify further".to_string());
            }
        }
        AdviceSignal::StrongReduce => {
            reasoning.push(format!("FGI as high as {fgi}: the market is extremely greedy"));
            reasoning.push(
                "Dropping the schedule to monthly with a 0.2x greed multiplier; hold cash for the pullback"
                    .to_string(),
            );
            reasoning
                .push("Extreme greed has historically accompanied short-term tops".to_string());
        }
    }

    Suggestion {
        frequency,
        fear_threshold,
        greed_threshold,
        fear_multiplier,
        greed_multiplier,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, FailingPrices, FailingSentiment, StaticPrices, StaticSentiment};

    fn fgi_points(values: &[u8]) -> Vec<FearGreedPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| FearGreedPoint {
                value,
                label: "test".to_string(),
                date: day(2024, 1, 31) - chrono::Days::new(i as u64),
            })
            .collect()
    }

    #[test]
    fn trend_detects_recovering_sentiment_as_rising() {
        // Newest-first: recent half well below the older half.
        let (trend, _) = compute_trend(&fgi_points(&[20, 20, 20, 50, 50, 50, 50]));
        assert_eq!(trend, FgiTrend::Rising);
    }

    #[test]
    fn trend_detects_deteriorating_sentiment_as_falling() {
        let (trend, _) = compute_trend(&fgi_points(&[60, 60, 60, 60, 30, 30, 30]));
        assert_eq!(trend, FgiTrend::Falling);
    }

    #[test]
    fn trend_within_band_is_stable() {
        let (trend, avg) = compute_trend(&fgi_points(&[52, 50, 49, 51, 50, 48, 50]));
        assert_eq!(trend, FgiTrend::Stable);
        assert_eq!(avg, 50);
    }

    #[test]
    fn single_sample_window_is_stable() {
        let (trend, avg) = compute_trend(&fgi_points(&[42]));
        assert_eq!(trend, FgiTrend::Stable);
        assert_eq!(avg, 42);
    }

    #[test]
    fn extreme_fear_with_crash_scores_strong_buy() {
        // Base -40, stable trend, 24h -12% adds -15: score -55.
        let (signal, confidence) = score_signal(15, FgiTrend::Stable, dec!(-12));
        assert_eq!(signal, AdviceSignal::StrongBuy);
        assert_eq!(confidence, 95);
    }

    #[test]
    fn mild_fear_scores_buy() {
        // Base -25, stable, no momentum: score -25.
        let (signal, confidence) = score_signal(30, FgiTrend::Stable, Decimal::ZERO);
        assert_eq!(signal, AdviceSignal::Buy);
        assert_eq!(confidence, 75);
    }

    #[test]
    fn midrange_scores_neutral() {
        let (signal, confidence) = score_signal(50, FgiTrend::Stable, Decimal::ZERO);
        assert_eq!(signal, AdviceSignal::Neutral);
        assert_eq!(confidence, 50);
    }

    #[test]
    fn greed_with_rising_trend_scores_strong_reduce() {
        // Base +25, rising +10: score 35.
        let (signal, _) = score_signal(75, FgiTrend::Rising, Decimal::ZERO);
        assert_eq!(signal, AdviceSignal::StrongReduce);
    }

    #[test]
    fn greed_alone_scores_reduce() {
        let (signal, _) = score_signal(75, FgiTrend::Stable, Decimal::ZERO);
        assert_eq!(signal, AdviceSignal::Reduce);
    }

    #[test]
    fn presets_follow_the_signal() {
        let strong = build_suggestion(AdviceSignal::StrongBuy, 12, FgiTrend::Stable, dec!(-6));
        assert_eq!(strong.frequency, Frequency::Daily);
        assert_eq!(strong.fear_threshold, 30);
        assert_eq!(strong.fear_multiplier, dec!(3.0));
        // The crash note is appended when the 24h drop is at least 5%.
        assert_eq!(strong.reasoning.len(), 3);

        let pause = build_suggestion(AdviceSignal::StrongReduce, 85, FgiTrend::Rising, Decimal::ZERO);
        assert_eq!(pause.frequency, Frequency::Monthly);
        assert_eq!(pause.greed_threshold, 65);
        assert_eq!(pause.greed_multiplier, dec!(0.2));
    }

    #[tokio::test]
    async fn analyze_scores_live_inputs() {
        let advisor = StrategyAdvisor::new(
            Arc::new(StaticPrices {
                series: vec![],
                spot: CurrentPrice {
                    price: dec!(60000),
                    change_24h: dec!(-6),
                    market_cap: Decimal::ZERO,
                },
            }),
            Arc::new(StaticSentiment(fgi_points(&[18, 20, 22, 30, 35, 40, 45]))),
            Duration::from_millis(200),
        );

        let analysis = advisor.analyze().await;
        // Base -40 (fgi 18), rising trend +10, -6% momentum -8: score -38.
        assert_eq!(analysis.signal, AdviceSignal::StrongBuy);
        assert_eq!(analysis.confidence, 88);
        assert_eq!(analysis.fgi.trend, FgiTrend::Rising);
        assert_eq!(analysis.suggestion.frequency, Frequency::Daily);
    }

    #[tokio::test]
    async fn analyze_degrades_to_unavailable_when_everything_fails() {
        let advisor = StrategyAdvisor::new(
            Arc::new(FailingPrices),
            Arc::new(FailingSentiment),
            Duration::from_millis(50),
        );

        let analysis = advisor.analyze().await;
        assert_eq!(analysis.confidence, 0);
        assert_eq!(analysis.signal, AdviceSignal::Neutral);
        assert_eq!(analysis.signal_label, "data unavailable");
        assert_eq!(analysis.fgi.value, 0);
    }
}
