use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(#[from] core_types::CoreError),

    #[error("Market data error during simulation: {0}")]
    MarketData(#[from] market_data::MarketDataError),

    #[error("No price data available for the requested date range.")]
    NoDataInRange,
}
