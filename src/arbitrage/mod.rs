//! Arbitrage detection from matched events.
//!
//! This module handles:
//! - Fee-aware cost and edge calculations with labeled fallback policies
//! - Opportunity detection across both legs of binary markets
//! - Risk scoring (timing, resolution)

pub mod calculator;
pub mod detector;

pub use calculator::{
    estimate_slippage, max_position, resolution_risk, timing_risk, total_leg_cost,
    ArbitrageOpportunity, ArbitrageType, FeeSchedule, Leg, PositionSizing, SizingPolicy,
    SlippagePolicy,
};
pub use detector::{ArbitrageDetector, DetectorConfig};
