//! # Performance Metrics
//!
//! Quantitative analysis of a completed accumulation trajectory. It acts as
//! the "unbiased judge" of the system.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** Every metric is a total function over its
//!   inputs. Division-guard conditions (zero invested capital, zero holdings,
//!   zero peak value) resolve to 0 instead of propagating a numeric error,
//!   which makes the functions highly reliable and easy to test.

// Declare the modules that constitute this crate.
pub mod metrics;

// Re-export the key components to create a clean, public-facing API.
pub use metrics::{annualized_return, average_cost, max_drawdown, roi};
