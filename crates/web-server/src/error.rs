use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use backtester::BacktestError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Backtest error: {0}")]
    Backtest(#[from] BacktestError),
    #[error("Market data error: {0}")]
    MarketData(#[from] market_data::MarketDataError),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Backtest(BacktestError::InvalidConfig(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Backtest(BacktestError::NoDataInRange) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                BacktestError::NoDataInRange.to_string(),
            ),
            AppError::Backtest(err) => {
                tracing::error!(error = ?err, "Backtest error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while running the simulation".to_string(),
                )
            }
            AppError::MarketData(err) => {
                tracing::error!(error = ?err, "Market data error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while fetching market data".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
