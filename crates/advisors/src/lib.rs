//! # Market Advisors
//!
//! Heuristic scorers that condense current market data into discrete,
//! explainable signals: a sentiment-driven strategy advisor, a macro
//! liquidity advisor, the Ahr999 valuation model and a dip-sizing rule.
//!
//! ## Architectural Principles
//!
//! - **Degrade, never fail:** Every provider fetch is wrapped in a
//!   timeout-with-fallback, so an advisor always produces an analysis; an
//!   unreachable data source downgrades the analysis (zero confidence, an
//!   "unavailable" sentinel, a fallback quote) instead of erroring.
//! - **Declarative scoring:** The if/else cascades of heuristic scoring are
//!   expressed as ordered threshold tables (see [`scoring`]), so each band is
//!   data, not branching code, and can be unit-tested per row.
//! - **Plain outputs:** Every analysis is a serializable record safe to
//!   render directly or hand to a tool-calling layer.

pub mod ahr999;
pub mod dip;
pub mod macro_liquidity;
mod scoring;
pub mod strategy;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the key components to create a clean, public-facing API.
pub use ahr999::{Ahr999Calculator, Ahr999Data, ValuationZone};
pub use dip::{calculate_buy_the_dip, DipAction, DipActionKind, DipConfig, RiskLevel};
pub use macro_liquidity::{MacroAdvisor, MacroAnalysis, MacroSignal};
pub use strategy::{AdviceSignal, FgiTrend, MarketAnalysis, StrategyAdvisor};
