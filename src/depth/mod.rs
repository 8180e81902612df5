//! Order-book depth analysis for arbitrage sizing.
//!
//! This module handles:
//! - Depth types (price levels, per-market aggregates, slippage estimates)
//! - Building `OrderbookDepth` from raw source levels
//! - Level-walk slippage simulation and two-leg feasibility assessment

pub mod analyzer;
pub mod slippage;
pub mod types;

pub use analyzer::{build_depth, DepthConfig, MarketDepthAnalyzer};
pub use slippage::{
    assess_arbitrage_feasibility, calculate_arbitrage_slippage, calculate_slippage,
};
pub use types::{
    ArbitrageLegs, DepthBucket, FeasibilityAssessment, OrderbookDepth, PriceLevel, RawLevel,
    Side, SlippageEstimate,
};
