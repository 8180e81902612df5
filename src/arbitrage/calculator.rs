//! Fee, slippage-fallback, sizing, and risk calculations for opportunities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use time::OffsetDateTime;

use crate::event::{Event, Venue};
use crate::matching::MatchResult;

/// Classification of a detected opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArbitrageType {
    /// Risk-free guaranteed profit (both legs settle to exactly $1).
    Pure,
    /// Positive expected value but not risk-free.
    Statistical,
}

/// One leg of a two-venue trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    /// Venue the leg trades on.
    pub venue: Venue,
    /// Contract side name ("YES"/"NO"/outcome).
    pub side: String,
    /// Quoted price of the side.
    pub price: Decimal,
}

/// A candidate cross-venue trade with its computed economics.
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    /// The match that produced this candidate.
    pub match_result: MatchResult,
    /// Pure vs statistical classification.
    pub arbitrage_type: ArbitrageType,

    /// Leg on the first event's venue.
    pub leg_a: Leg,
    /// Leg on the second event's venue.
    pub leg_b: Leg,

    /// Edge before slippage: 1 − total fee-adjusted cost.
    pub gross_edge: Decimal,
    /// Edge after the slippage estimate.
    pub net_edge: Decimal,
    /// Liquidity-capped position size (pre-depth heuristic).
    pub max_position_size: Decimal,
    /// net_edge × max_position_size.
    pub expected_profit: Decimal,

    /// Combined heuristic slippage for both legs.
    pub slippage_estimate: Decimal,
    /// Timing risk in [0, 1] from the deadline gap.
    pub timing_risk_score: f64,
    /// Resolution risk in [0, 1] from match quality.
    pub resolution_risk_score: f64,

    /// Confidence inherited from the match.
    pub confidence_score: f64,
    /// When the opportunity was detected.
    pub detected_at: OffsetDateTime,
    /// Earliest of the two deadlines, after which the edge is moot.
    pub expires_at: Option<OffsetDateTime>,
}

/// Typed per-venue fee schedule, validated at configuration load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Proportional trading fee (0.02 = 2%).
    pub trading_fee_rate: Decimal,
    /// Fixed per-trade cost (gas, network routing).
    pub fixed_cost: Decimal,
}

impl FeeSchedule {
    /// A zero-fee schedule, for tests and fee-free venues.
    pub fn free() -> Self {
        Self {
            trading_fee_rate: Decimal::ZERO,
            fixed_cost: Decimal::ZERO,
        }
    }

    /// Check the schedule is usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.trading_fee_rate < Decimal::ZERO {
            return Err(format!(
                "trading_fee_rate must be non-negative, got {}",
                self.trading_fee_rate
            ));
        }
        if self.fixed_cost < Decimal::ZERO {
            return Err(format!(
                "fixed_cost must be non-negative, got {}",
                self.fixed_cost
            ));
        }
        Ok(())
    }
}

/// Total cost of buying one share at `price` under the venue's fees.
pub fn total_leg_cost(price: Decimal, fees: &FeeSchedule) -> Decimal {
    price * (Decimal::ONE + fees.trading_fee_rate) + fees.fixed_cost
}

/// Which fallback path produced a heuristic slippage estimate.
///
/// Kept explicit so callers and tests can tell a labeled fallback apart
/// from an unknown value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SlippagePolicy {
    /// Liquidity unknown: conservative default band.
    MissingLiquidityDefault,
    /// Liquidity above 10 000.
    HighLiquidity,
    /// Liquidity above 1 000.
    MediumLiquidity,
    /// Thin book.
    LowLiquidity,
}

/// Heuristic slippage band for one leg, used only when live depth is
/// unavailable; depth-based estimates supersede these numbers.
pub fn estimate_slippage(liquidity: Option<Decimal>) -> (Decimal, SlippagePolicy) {
    match liquidity {
        None => (Decimal::new(5, 3), SlippagePolicy::MissingLiquidityDefault), // 0.5%
        Some(liq) if liq > Decimal::new(10_000, 0) => {
            (Decimal::new(1, 3), SlippagePolicy::HighLiquidity) // 0.1%
        }
        Some(liq) if liq > Decimal::new(1_000, 0) => {
            (Decimal::new(3, 3), SlippagePolicy::MediumLiquidity) // 0.3%
        }
        Some(_) => (Decimal::new(1, 2), SlippagePolicy::LowLiquidity), // 1.0%
    }
}

/// Position-sizing parameters for the pre-depth heuristic.
#[derive(Debug, Clone, Copy)]
pub struct PositionSizing {
    /// Fraction of a leg's liquidity considered safe to take.
    pub liquidity_fraction: Decimal,
    /// Absolute cap on position size.
    pub hard_cap: Decimal,
    /// Conservative size when liquidity is unknown.
    pub default_size: Decimal,
}

impl Default for PositionSizing {
    fn default() -> Self {
        Self {
            liquidity_fraction: Decimal::new(1, 1), // 10%
            hard_cap: Decimal::new(10_000, 0),
            default_size: Decimal::new(100, 0),
        }
    }
}

impl PositionSizing {
    /// Check the sizing parameters are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.liquidity_fraction <= Decimal::ZERO || self.liquidity_fraction > Decimal::ONE {
            return Err(format!(
                "liquidity_fraction must be in (0, 1], got {}",
                self.liquidity_fraction
            ));
        }
        if self.hard_cap <= Decimal::ZERO {
            return Err(format!("hard_cap must be positive, got {}", self.hard_cap));
        }
        if self.default_size <= Decimal::ZERO {
            return Err(format!(
                "default_size must be positive, got {}",
                self.default_size
            ));
        }
        Ok(())
    }
}

/// Which fallback path produced a heuristic position cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SizingPolicy {
    /// Liquidity unknown: conservative default size.
    MissingLiquidityDefault,
    /// Capped at a fraction of reported liquidity.
    LiquidityFraction,
}

/// Heuristic position cap for one leg; depth-based sizing supersedes it.
pub fn max_position(
    liquidity: Option<Decimal>,
    sizing: &PositionSizing,
) -> (Decimal, SizingPolicy) {
    match liquidity {
        None => (sizing.default_size, SizingPolicy::MissingLiquidityDefault),
        Some(liq) => (
            (liq * sizing.liquidity_fraction).min(sizing.hard_cap),
            SizingPolicy::LiquidityFraction,
        ),
    }
}

/// Timing risk from the deadline gap: a week apart saturates to 1.
pub fn timing_risk(event_a: &Event, event_b: &Event) -> f64 {
    let gap_days = event_a.deadline_gap_days(event_b) as f64;
    (gap_days / 7.0).min(1.0)
}

/// Resolution risk from match quality: low confidence plus a penalty
/// per detected risk factor, saturating at 1.
pub fn resolution_risk(match_result: &MatchResult) -> f64 {
    let base = 1.0 - match_result.confidence_score;
    let penalty = match_result.risk_factors.len() as f64 * 0.1;
    (base + penalty).min(1.0)
}
