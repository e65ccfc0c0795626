//! Ladder-based dip-sizing rule.
//!
//! Given the available fiat reserve and the current fear level, recommends
//! how much (if anything) to deploy on top of the regular schedule.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use configuration::DipDefaults;

/// Cap multiples and reserve shares for the two fear rungs of the ladder.
const EXTREME_FEAR_MULTIPLE: Decimal = dec!(5);
const EXTREME_FEAR_RESERVE_SHARE: Decimal = dec!(0.30);
const FEAR_MULTIPLE: Decimal = dec!(2);
const FEAR_RESERVE_SHARE: Decimal = dec!(0.10);

/// Sentiment level at or above which cash is accumulated instead.
const GREED_FLOOR: u8 = 75;

/// Buys below this are downgraded to HOLD; fees would eat them.
const MIN_BUY_USD: Decimal = dec!(10);

/// A sizing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DipConfig {
    pub available_fiat: Decimal,
    /// The regular per-interval DCA amount the ladder scales from.
    pub base_amount: Decimal,
    pub current_fgi: u8,
    pub current_price: Decimal,
    #[serde(default)]
    pub extreme_fear_threshold: Option<u8>,
    #[serde(default)]
    pub fear_threshold: Option<u8>,
}

/// What to do with the reserve right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DipActionKind {
    Buy,
    Hold,
    AccumulateFiat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

/// The sizing recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DipAction {
    pub action: DipActionKind,
    pub recommended_amount: Decimal,
    pub reasoning: Vec<String>,
    pub risk_level: RiskLevel,
}

/// Applies the fear ladder to the request.
///
/// The recommended amount is always capped at the available reserve, and a
/// BUY below [`MIN_BUY_USD`] is downgraded to HOLD.
pub fn calculate_buy_the_dip(config: &DipConfig, defaults: &DipDefaults) -> DipAction {
    let extreme_threshold = config
        .extreme_fear_threshold
        .unwrap_or(defaults.extreme_fear_threshold);
    let fear_threshold = config.fear_threshold.unwrap_or(defaults.fear_threshold);
    let fgi = config.current_fgi;

    let mut reasoning = Vec::new();

    if config.available_fiat <= Decimal::ZERO {
        reasoning.push("No fiat reserve available; an extra buy cannot be funded.".to_string());
        return DipAction {
            action: DipActionKind::Hold,
            recommended_amount: Decimal::ZERO,
            reasoning,
            risk_level: RiskLevel::Medium,
        };
    }

    let mut action;
    let mut recommended_amount;
    let risk_level;

    if fgi <= extreme_threshold {
        action = DipActionKind::Buy;
        risk_level = RiskLevel::Extreme;
        // Deep panic: up to 5x the base amount, but never more than 30% of
        // the reserve in one go.
        let by_base = config.base_amount * EXTREME_FEAR_MULTIPLE;
        let by_reserve = config.available_fiat * EXTREME_FEAR_RESERVE_SHARE;
        recommended_amount = by_base.min(by_reserve);

        reasoning.push(format!(
            "Fear & Greed Index at {fgi}: extreme fear band (<= {extreme_threshold})."
        ));
        reasoning.push(format!(
            "Ladder triggered at up to 5x the base amount: recommending ${recommended_amount:.2}."
        ));
        reasoning.push(format!(
            "This uses about {:.1}% of the available reserve.",
            recommended_amount / config.available_fiat * Decimal::ONE_HUNDRED
        ));
    } else if fgi <= fear_threshold {
        action = DipActionKind::Buy;
        risk_level = RiskLevel::High;
        let by_base = config.base_amount * FEAR_MULTIPLE;
        let by_reserve = config.available_fiat * FEAR_RESERVE_SHARE;
        recommended_amount = by_base.min(by_reserve);

        reasoning.push(format!(
            "Fear & Greed Index at {fgi}: fear band (<= {fear_threshold})."
        ));
        reasoning.push(format!(
            "Moderate add at 2x the base amount: recommending ${recommended_amount:.2}."
        ));
    } else if fgi >= GREED_FLOOR {
        action = DipActionKind::AccumulateFiat;
        risk_level = RiskLevel::Low;
        recommended_amount = Decimal::ZERO;
        reasoning.push(format!("FGI at {fgi}: the market is extremely greedy."));
        reasoning.push(
            "Pause extra buying and accumulate fiat for the next pullback.".to_string(),
        );
    } else {
        action = DipActionKind::Hold;
        risk_level = RiskLevel::Medium;
        recommended_amount = config.base_amount;
        reasoning.push(format!("FGI at {fgi}: sentiment is neutral."));
        reasoning.push(format!(
            "Maintain the regular DCA plan (${}).",
            config.base_amount
        ));
    }

    // The reserve is a hard ceiling regardless of the rung.
    if recommended_amount > config.available_fiat {
        recommended_amount = config.available_fiat;
    }

    if action == DipActionKind::Buy && recommended_amount < MIN_BUY_USD {
        reasoning.push(
            "The computed buy is too small to be fee-efficient; holding instead.".to_string(),
        );
        action = DipActionKind::Hold;
        recommended_amount = Decimal::ZERO;
    }

    DipAction {
        action,
        recommended_amount,
        reasoning,
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(available_fiat: Decimal, base_amount: Decimal, fgi: u8) -> DipConfig {
        DipConfig {
            available_fiat,
            base_amount,
            current_fgi: fgi,
            current_price: dec!(60000),
            extreme_fear_threshold: None,
            fear_threshold: None,
        }
    }

    fn run(config: &DipConfig) -> DipAction {
        calculate_buy_the_dip(config, &DipDefaults::default())
    }

    #[test]
    fn empty_reserve_always_holds() {
        let action = run(&request(Decimal::ZERO, dec!(100), 10));
        assert_eq!(action.action, DipActionKind::Hold);
        assert_eq!(action.recommended_amount, Decimal::ZERO);
        assert_eq!(action.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn extreme_fear_sizes_five_times_base() {
        let action = run(&request(dec!(10000), dec!(100), 15));
        assert_eq!(action.action, DipActionKind::Buy);
        assert_eq!(action.risk_level, RiskLevel::Extreme);
        // 5 x 100 is below 30% of the reserve.
        assert_eq!(action.recommended_amount, dec!(500));
    }

    #[test]
    fn extreme_fear_is_capped_by_reserve_share() {
        let action = run(&request(dec!(1000), dec!(1000), 10));
        // 5x base would be 5000; 30% of the reserve wins.
        assert_eq!(action.recommended_amount, dec!(300));
    }

    #[test]
    fn ordinary_fear_sizes_twice_base() {
        let action = run(&request(dec!(10000), dec!(100), 35));
        assert_eq!(action.action, DipActionKind::Buy);
        assert_eq!(action.risk_level, RiskLevel::High);
        assert_eq!(action.recommended_amount, dec!(200));
    }

    #[test]
    fn greed_accumulates_fiat() {
        let action = run(&request(dec!(10000), dec!(100), 80));
        assert_eq!(action.action, DipActionKind::AccumulateFiat);
        assert_eq!(action.recommended_amount, Decimal::ZERO);
        assert_eq!(action.risk_level, RiskLevel::Low);
    }

    #[test]
    fn neutral_sentiment_keeps_the_regular_plan() {
        let action = run(&request(dec!(10000), dec!(100), 55));
        assert_eq!(action.action, DipActionKind::Hold);
        assert_eq!(action.recommended_amount, dec!(100));
        assert_eq!(action.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn micro_buys_are_downgraded_to_hold() {
        // 5 x 1.998 = 9.99, just under the floor.
        let action = run(&request(dec!(10000), dec!(1.998), 10));
        assert_eq!(action.action, DipActionKind::Hold);
        assert_eq!(action.recommended_amount, Decimal::ZERO);

        // Exactly 10.00 stays a buy.
        let action = run(&request(dec!(10000), dec!(2), 10));
        assert_eq!(action.action, DipActionKind::Buy);
        assert_eq!(action.recommended_amount, dec!(10));
    }

    #[test]
    fn reserve_cap_can_push_a_buy_under_the_floor() {
        // Fear rung: 2 x 100 = 200, but 10% of a 50 reserve is 5, and the
        // floor then downgrades the buy entirely.
        let action = run(&request(dec!(50), dec!(100), 35));
        assert_eq!(action.action, DipActionKind::Hold);
        assert_eq!(action.recommended_amount, Decimal::ZERO);
    }

    #[test]
    fn explicit_thresholds_override_the_defaults() {
        let mut config = request(dec!(10000), dec!(100), 25);
        config.extreme_fear_threshold = Some(30);
        let action = run(&config);
        assert_eq!(action.risk_level, RiskLevel::Extreme);
    }
}
