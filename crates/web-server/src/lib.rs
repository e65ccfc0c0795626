//! Thin JSON API over the simulation and advisory engines, for the
//! dashboard and tool-calling consumers.

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use advisors::{Ahr999Calculator, MacroAdvisor, StrategyAdvisor};
use backtester::Backtester;
use configuration::DipDefaults;
use market_data::{PriceProvider, SentimentProvider};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub backtester: Backtester,
    pub strategy_advisor: StrategyAdvisor,
    pub macro_advisor: MacroAdvisor,
    pub ahr999: Ahr999Calculator,
    pub prices: Arc<dyn PriceProvider>,
    pub sentiment: Arc<dyn SentimentProvider>,
    pub dip_defaults: DipDefaults,
}

/// The main function to configure and run the web server.
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // --- DEFINE THE APPLICATION ROUTES ---
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/backtest", post(handlers::run_backtest))
        .route("/api/strategy-advice", get(handlers::strategy_advice))
        .route("/api/macro", get(handlers::macro_liquidity))
        .route("/api/ahr999", get(handlers::ahr999))
        .route("/api/dip", post(handlers::dip))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http());

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
