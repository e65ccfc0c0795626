pub mod enums;
pub mod error;
pub mod market;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Frequency, StrategyKind};
pub use error::CoreError;
pub use market::{CurrentPrice, FearGreedPoint, Quote, SearchInterest, SearchTrend};
pub use structs::{BacktestResult, BuyEvent, ComparisonResult, DcaConfig, PricePoint};
