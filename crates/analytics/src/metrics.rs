use core_types::BuyEvent;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Total return on invested capital, in percent.
///
/// Defined as 0 when nothing was invested.
pub fn roi(total_invested: Decimal, final_value: Decimal) -> f64 {
    if total_invested.is_zero() {
        return 0.0;
    }
    ((final_value - total_invested) / total_invested * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}

/// The constant yearly growth rate implied by the total return over `days`,
/// in percent.
///
/// Defined as 0 when nothing was invested or no time elapsed. The exponent is
/// evaluated in `f64`; a controlled precision trade-off, since the result is a
/// reporting metric rather than a money amount.
pub fn annualized_return(total_invested: Decimal, final_value: Decimal, days: i64) -> f64 {
    if total_invested.is_zero() || days == 0 {
        return 0.0;
    }
    let total_return = (final_value / total_invested).to_f64().unwrap_or(0.0);
    let years = days as f64 / 365.0;
    (total_return.powf(1.0 / years) - 1.0) * 100.0
}

/// Largest peak-to-trough decline of `portfolio_value` across the ordered
/// event sequence, in percent.
///
/// The first event establishes the peak before any drawdown is computed, so
/// an empty or single-event trajectory reports 0.
pub fn max_drawdown(buys: &[BuyEvent]) -> f64 {
    if buys.is_empty() {
        return 0.0;
    }

    let mut peak = Decimal::ZERO;
    let mut max_dd = Decimal::ZERO;

    for buy in buys {
        if buy.portfolio_value > peak {
            peak = buy.portfolio_value;
        }
        if peak.is_zero() {
            continue;
        }
        let drawdown = (peak - buy.portfolio_value) / peak * Decimal::ONE_HUNDRED;
        if drawdown > max_dd {
            max_dd = drawdown;
        }
    }

    max_dd.to_f64().unwrap_or(0.0)
}

/// Average USD paid per BTC across the whole trajectory.
///
/// Defined as 0 when no BTC was acquired.
pub fn average_cost(total_invested: Decimal, total_btc: Decimal) -> Decimal {
    if total_btc.is_zero() {
        return Decimal::ZERO;
    }
    total_invested / total_btc
}
