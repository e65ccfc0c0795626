use crate::{error::AppError, AppState};
use axum::{extract::State, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use advisors::{calculate_buy_the_dip, Ahr999Data, DipAction, DipConfig, MacroAnalysis, MarketAnalysis};
use core_types::{DcaConfig, StrategyKind};

#[derive(Debug, Deserialize)]
pub struct BacktestRequest {
    #[serde(flatten)]
    pub config: DcaConfig,
    /// When set, all three strategies are simulated and bundled.
    #[serde(default)]
    pub compare: bool,
}

/// # POST /api/backtest
///
/// Runs a single simulation (smart or standard, per the config flag), or the
/// full three-way comparison when `compare` is set.
pub async fn run_backtest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BacktestRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.compare {
        let comparison = state.backtester.compare(&request.config).await?;
        return Ok(Json(comparison).into_response());
    }

    let kind = if request.config.smart_dca {
        StrategyKind::Smart
    } else {
        StrategyKind::Standard
    };
    let result = state.backtester.simulate(&request.config, kind).await?;
    Ok(Json(result).into_response())
}

/// # GET /api/strategy-advice
pub async fn strategy_advice(State(state): State<Arc<AppState>>) -> Json<MarketAnalysis> {
    Json(state.strategy_advisor.analyze().await)
}

/// # GET /api/macro
pub async fn macro_liquidity(State(state): State<Arc<AppState>>) -> Json<MacroAnalysis> {
    Json(state.macro_advisor.analyze().await)
}

/// # GET /api/ahr999
pub async fn ahr999(State(state): State<Arc<AppState>>) -> Json<Ahr999Data> {
    Json(state.ahr999.calculate().await)
}

#[derive(Debug, Deserialize)]
pub struct DipRequest {
    #[serde(default)]
    pub available_fiat: Decimal,
    #[serde(default = "default_base_amount")]
    pub base_amount: Decimal,
}

fn default_base_amount() -> Decimal {
    Decimal::ONE_HUNDRED
}

#[derive(Debug, Serialize)]
pub struct DipResponse {
    pub action: DipAction,
    pub market: DipMarket,
}

#[derive(Debug, Serialize)]
pub struct DipMarket {
    pub btc_price: Decimal,
    pub fgi_value: u8,
    pub fgi_label: String,
}

/// # POST /api/dip
///
/// Fetches the live spot price and fear level, then applies the sizing
/// ladder to the caller's reserve.
pub async fn dip(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DipRequest>,
) -> Result<Json<DipResponse>, AppError> {
    let (btc, fgi) = tokio::try_join!(state.prices.current_price(), state.sentiment.current())?;

    let action = calculate_buy_the_dip(
        &DipConfig {
            available_fiat: request.available_fiat,
            base_amount: request.base_amount,
            current_fgi: fgi.value,
            current_price: btc.price,
            extreme_fear_threshold: None,
            fear_threshold: None,
        },
        &state.dip_defaults,
    );

    Ok(Json(DipResponse {
        action,
        market: DipMarket {
            btc_price: btc.price,
            fgi_value: fgi.value,
            fgi_label: fgi.label,
        },
    }))
}
