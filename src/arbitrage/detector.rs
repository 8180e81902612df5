//! Scanning matched events for arbitrage opportunities.

use std::collections::HashMap;

use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};

use super::calculator::{
    estimate_slippage, max_position, resolution_risk, timing_risk, total_leg_cost,
    ArbitrageOpportunity, ArbitrageType, FeeSchedule, Leg, PositionSizing,
};
use crate::error::ScoutError;
use crate::event::{Event, MarketType, Venue};
use crate::matching::MatchResult;
use crate::metrics;

/// Configuration for the arbitrage detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Matches below this confidence are not economically evaluated.
    /// Independent of (and stricter than) the matcher's own threshold.
    pub min_confidence: f64,
    /// Minimum gross edge for an opportunity to be kept.
    pub min_edge_threshold: Decimal,
    /// Maximum combined heuristic slippage before discarding.
    pub max_slippage_tolerance: Decimal,
    /// Typed per-venue fee schedules.
    pub fees: HashMap<Venue, FeeSchedule>,
    /// Heuristic position-sizing parameters.
    pub sizing: PositionSizing,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            min_edge_threshold: Decimal::new(2, 2),      // 2%
            max_slippage_tolerance: Decimal::new(1, 2),  // 1%
            fees: HashMap::new(),
            sizing: PositionSizing::default(),
        }
    }
}

impl DetectorConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            ));
        }
        if self.min_edge_threshold < Decimal::ZERO {
            return Err(format!(
                "min_edge_threshold must be non-negative, got {}",
                self.min_edge_threshold
            ));
        }
        if self.max_slippage_tolerance < Decimal::ZERO {
            return Err(format!(
                "max_slippage_tolerance must be non-negative, got {}",
                self.max_slippage_tolerance
            ));
        }
        for (venue, fees) in &self.fees {
            fees.validate().map_err(|e| format!("fees for {venue}: {e}"))?;
        }
        self.sizing.validate()?;
        Ok(())
    }
}

/// Detects arbitrage opportunities from matched events.
///
/// Pure over its inputs: no internal mutable state, safe to call
/// concurrently for different match batches.
pub struct ArbitrageDetector {
    config: DetectorConfig,
}

impl ArbitrageDetector {
    /// Build a detector, rejecting misconfiguration up front.
    pub fn new(config: DetectorConfig) -> Result<Self, ScoutError> {
        config.validate().map_err(ScoutError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Scan matches for opportunities, sorted by net edge descending.
    ///
    /// Binary pairs are checked in both directions, since fee asymmetry
    /// can make one direction profitable and the mirror not.
    #[instrument(skip_all, fields(matches = matches.len()))]
    pub fn scan_for_arbitrage(&self, matches: &[MatchResult]) -> Vec<ArbitrageOpportunity> {
        let mut opportunities = Vec::new();

        for m in matches {
            if m.confidence_score < self.config.min_confidence {
                debug!(
                    confidence = m.confidence_score,
                    "match below economic confidence floor"
                );
                continue;
            }

            if m.event_a.market_type == MarketType::Binary
                && m.event_b.market_type == MarketType::Binary
            {
                if let Some(opp) = self.check_binary_arbitrage(m, "YES", "NO") {
                    opportunities.push(opp);
                }
                if let Some(opp) = self.check_binary_arbitrage(m, "NO", "YES") {
                    opportunities.push(opp);
                }
            }
        }

        opportunities.sort_by(|a, b| b.net_edge.cmp(&a.net_edge));

        metrics::add_opportunities_detected(opportunities.len() as u64);
        opportunities
    }

    /// Check one direction of a binary pair: buy `side_a` on the first
    /// venue and `side_b` on the second.
    fn check_binary_arbitrage(
        &self,
        m: &MatchResult,
        side_a: &str,
        side_b: &str,
    ) -> Option<ArbitrageOpportunity> {
        let contract_a = m.event_a.contract_side(side_a)?;
        let contract_b = m.event_b.contract_side(side_b)?;

        let fees_a = self.venue_fees(&m.event_a)?;
        let fees_b = self.venue_fees(&m.event_b)?;

        let cost_a = total_leg_cost(contract_a.price, fees_a);
        let cost_b = total_leg_cost(contract_b.price, fees_b);
        let total_cost = cost_a + cost_b;

        // Binary pure arbitrage: both sides settle to exactly $1, so any
        // combined cost under $1 locks in the difference.
        if total_cost >= Decimal::ONE {
            return None;
        }

        let gross_edge = Decimal::ONE - total_cost;
        if gross_edge < self.config.min_edge_threshold {
            return None;
        }

        let (slippage_a, _) = estimate_slippage(contract_a.liquidity);
        let (slippage_b, _) = estimate_slippage(contract_b.liquidity);
        let total_slippage = slippage_a + slippage_b;

        if total_slippage > self.config.max_slippage_tolerance {
            debug!(
                slippage = %total_slippage,
                tolerance = %self.config.max_slippage_tolerance,
                "heuristic slippage exceeds tolerance"
            );
            return None;
        }

        let net_edge = gross_edge - total_slippage;

        let (max_a, _) = max_position(contract_a.liquidity, &self.config.sizing);
        let (max_b, _) = max_position(contract_b.liquidity, &self.config.sizing);
        let max_position_size = max_a.min(max_b);

        let expected_profit = net_edge * max_position_size;

        Some(ArbitrageOpportunity {
            match_result: m.clone(),
            arbitrage_type: ArbitrageType::Pure,
            leg_a: Leg {
                venue: m.event_a.venue,
                side: side_a.to_string(),
                price: contract_a.price,
            },
            leg_b: Leg {
                venue: m.event_b.venue,
                side: side_b.to_string(),
                price: contract_b.price,
            },
            gross_edge,
            net_edge,
            max_position_size,
            expected_profit,
            slippage_estimate: total_slippage,
            timing_risk_score: timing_risk(&m.event_a, &m.event_b),
            resolution_risk_score: resolution_risk(m),
            confidence_score: m.confidence_score,
            detected_at: OffsetDateTime::now_utc(),
            expires_at: Some(m.event_a.deadline.min(m.event_b.deadline)),
        })
    }

    /// Fee schedule for an event's venue; a venue with no configured
    /// schedule skips the pair rather than defaulting to zero fees.
    fn venue_fees(&self, event: &Event) -> Option<&FeeSchedule> {
        let fees = self.config.fees.get(&event.venue);
        if fees.is_none() {
            warn!(venue = %event.venue, "no fee schedule for venue, skipping");
        }
        fees
    }
}
