//! Cross-venue event matching with weighted multi-strategy scoring.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::Display;
use tracing::{debug, instrument, warn};

use crate::error::ScoutError;
use crate::event::Event;
use crate::metrics;

use super::strategies::{
    default_strategies, MatchStrategy, SemanticScorer, STRATEGY_ENTITY_OVERLAP,
    STRATEGY_EXACT_TITLE, STRATEGY_FUZZY_TITLE, STRATEGY_RESOLUTION_CRITERIA, STRATEGY_SEMANTIC,
    STRATEGY_TEMPORAL,
};

/// Configuration for the event matcher.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum confidence for a pair to be emitted at all.
    pub confidence_threshold: f64,
    /// Below this confidence a match always requires human review.
    pub review_confidence_floor: f64,
    /// Deadline gap (whole days) beyond which review is required.
    pub review_deadline_gap_days: i64,
    /// Strategy name -> weight in the linear combination.
    pub strategy_weights: HashMap<String, f64>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.75,
            review_confidence_floor: 0.9,
            review_deadline_gap_days: 1,
            strategy_weights: HashMap::from([
                (STRATEGY_EXACT_TITLE.to_string(), 0.30),
                (STRATEGY_FUZZY_TITLE.to_string(), 0.20),
                (STRATEGY_ENTITY_OVERLAP.to_string(), 0.20),
                (STRATEGY_SEMANTIC.to_string(), 0.15),
                (STRATEGY_RESOLUTION_CRITERIA.to_string(), 0.10),
                (STRATEGY_TEMPORAL.to_string(), 0.05),
            ]),
        }
    }
}

impl MatcherConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.review_confidence_floor) {
            return Err(format!(
                "review_confidence_floor must be in [0, 1], got {}",
                self.review_confidence_floor
            ));
        }
        if self.review_deadline_gap_days < 0 {
            return Err("review_deadline_gap_days must be non-negative".to_string());
        }
        for (name, weight) in &self.strategy_weights {
            if *weight < 0.0 {
                return Err(format!("strategy weight for {name} must be non-negative"));
            }
        }
        Ok(())
    }
}

/// Risks that make a numerically confident match economically unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskFactor {
    /// Both events state a resolution source and they differ.
    DifferentResolutionSources,
    /// Deadlines more than a week apart.
    DeadlineMismatchGtWeek,
    /// Different outcome-space structures.
    DifferentMarketTypes,
}

/// Result of evaluating one cross-venue event pair.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// First event of the pair.
    pub event_a: Event,
    /// Second event of the pair.
    pub event_b: Event,
    /// Weighted combination of contributing strategy scores, in [0, 1].
    pub confidence_score: f64,
    /// Names of the strategies that contributed a non-zero score.
    pub match_strategies: Vec<&'static str>,
    /// Detected risks, independent of the score.
    pub risk_factors: Vec<RiskFactor>,
    /// Whether this match must not be acted on unattended.
    pub human_review_required: bool,
}

/// Matches events across venues using a weighted strategy registry.
pub struct EventMatcher {
    strategies: Vec<(Box<dyn MatchStrategy>, f64)>,
    config: MatcherConfig,
}

impl EventMatcher {
    /// Build a matcher from a strategy registry and configuration.
    ///
    /// Every registered strategy must have a configured weight; this is
    /// the only fatal misconfiguration path.
    pub fn new(
        strategies: Vec<Box<dyn MatchStrategy>>,
        config: MatcherConfig,
    ) -> Result<Self, ScoutError> {
        config.validate().map_err(ScoutError::InvalidConfig)?;

        let mut weighted = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            let weight = config
                .strategy_weights
                .get(strategy.name())
                .copied()
                .ok_or_else(|| {
                    ScoutError::InvalidConfig(format!(
                        "no weight configured for strategy {}",
                        strategy.name()
                    ))
                })?;
            weighted.push((strategy, weight));
        }

        Ok(Self {
            strategies: weighted,
            config,
        })
    }

    /// Build a matcher with the standard strategies and default weights.
    pub fn with_defaults(semantic_scorer: Option<Arc<dyn SemanticScorer>>) -> Self {
        Self::new(default_strategies(semantic_scorer), MatcherConfig::default())
            .expect("default matcher configuration is valid")
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Find all matches between two event lists.
    ///
    /// Same-venue pairs are skipped, malformed events are skipped with a
    /// warning, and only pairs at or above the confidence threshold are
    /// returned. Each pair's evaluation is independent and side-effect
    /// free.
    #[instrument(skip_all, fields(events_a = events_a.len(), events_b = events_b.len()))]
    pub fn find_matches(&self, events_a: &[Event], events_b: &[Event]) -> Vec<MatchResult> {
        let mut matches = Vec::new();

        for event_a in events_a {
            if !event_a.is_well_formed() {
                warn!(event_id = %event_a.event_id, "skipping malformed event");
                continue;
            }
            for event_b in events_b {
                if event_a.venue == event_b.venue {
                    continue;
                }
                if !event_b.is_well_formed() {
                    continue;
                }

                metrics::inc_pairs_evaluated();

                if let Some(result) = self.evaluate_pair(event_a, event_b) {
                    if result.confidence_score >= self.config.confidence_threshold {
                        metrics::inc_matches_found();
                        matches.push(result);
                    }
                }
            }
        }

        debug!(matches = matches.len(), "matching complete");
        matches
    }

    /// Evaluate whether two events represent the same underlying outcome.
    ///
    /// Returns `None` when no strategy contributed a positive score.
    fn evaluate_pair(&self, event_a: &Event, event_b: &Event) -> Option<MatchResult> {
        let mut contributions: SmallVec<[(&'static str, f64); 6]> = SmallVec::new();

        for (strategy, weight) in &self.strategies {
            match strategy.score(event_a, event_b) {
                Ok(Some(score)) if score > 0.0 => {
                    contributions.push((strategy.name(), score * weight));
                }
                Ok(_) => {} // abstained or scored zero: no contribution
                Err(e) => {
                    metrics::inc_strategy_failures();
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "strategy failed, skipping"
                    );
                }
            }
        }

        if contributions.is_empty() {
            return None;
        }

        let confidence_score: f64 = contributions.iter().map(|(_, c)| c).sum();
        let match_strategies: Vec<&'static str> =
            contributions.iter().map(|(name, _)| *name).collect();

        let risk_factors = detect_risk_factors(event_a, event_b);

        let deadline_gap = event_a.deadline_gap_days(event_b);
        let human_review_required = confidence_score < self.config.review_confidence_floor
            || !risk_factors.is_empty()
            || deadline_gap > self.config.review_deadline_gap_days;

        Some(MatchResult {
            event_a: event_a.clone(),
            event_b: event_b.clone(),
            confidence_score,
            match_strategies,
            risk_factors,
            human_review_required,
        })
    }
}

/// Detect risks in a candidate match, independent of scoring.
fn detect_risk_factors(event_a: &Event, event_b: &Event) -> Vec<RiskFactor> {
    let mut risks = Vec::new();

    if let (Some(url_a), Some(url_b)) = (
        &event_a.resolution_source_url,
        &event_b.resolution_source_url,
    ) {
        if url_a != url_b {
            risks.push(RiskFactor::DifferentResolutionSources);
        }
    }

    if event_a.deadline_gap_days(event_b) > 7 {
        risks.push(RiskFactor::DeadlineMismatchGtWeek);
    }

    if event_a.market_type != event_b.market_type {
        risks.push(RiskFactor::DifferentMarketTypes);
    }

    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrategyError;
    use crate::event::{ContractSide, MarketType, Venue};
    use rust_decimal_macros::dec;
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn event(id: &str, title: &str, venue: Venue, deadline: OffsetDateTime) -> Event {
        Event {
            event_id: id.to_string(),
            source_ids: HashMap::new(),
            title: title.to_string(),
            entities: vec!["BTC".to_string()],
            category: "crypto".to_string(),
            resolution_criteria: "Settles YES if BTC closes above 100000".to_string(),
            resolution_source_url: None,
            deadline,
            venue,
            market_type: MarketType::Binary,
            contract_sides: vec![
                ContractSide {
                    side_id: "yes".to_string(),
                    name: "YES".to_string(),
                    price: dec!(0.55),
                    implied_probability: dec!(0.55),
                    volume_24h: None,
                    liquidity: Some(dec!(5000)),
                },
                ContractSide {
                    side_id: "no".to_string(),
                    name: "NO".to_string(),
                    price: dec!(0.45),
                    implied_probability: dec!(0.45),
                    volume_24h: None,
                    liquidity: Some(dec!(5000)),
                },
            ],
            total_volume: None,
            created_at: datetime!(2026-01-01 00:00 UTC),
            updated_at: datetime!(2026-01-01 00:00 UTC),
        }
    }

    /// Strategy returning a fixed score under a fixed name.
    struct Fixed(&'static str, Option<f64>);

    impl MatchStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn score(&self, _: &Event, _: &Event) -> Result<Option<f64>, StrategyError> {
            Ok(self.1)
        }
    }

    /// Strategy that always fails.
    struct Failing;

    impl MatchStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn score(&self, _: &Event, _: &Event) -> Result<Option<f64>, StrategyError> {
            Err(StrategyError::Failed("boom".to_string()))
        }
    }

    fn matcher_with(
        strategies: Vec<Box<dyn MatchStrategy>>,
        weights: &[(&str, f64)],
        threshold: f64,
    ) -> EventMatcher {
        let config = MatcherConfig {
            confidence_threshold: threshold,
            strategy_weights: weights
                .iter()
                .map(|(n, w)| (n.to_string(), *w))
                .collect(),
            ..MatcherConfig::default()
        };
        EventMatcher::new(strategies, config).unwrap()
    }

    #[test]
    fn same_venue_pairs_are_never_matched() {
        let matcher = EventMatcher::with_defaults(None);
        let a = vec![event("a1", "Same title", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];
        let b = vec![event("b1", "Same title", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];

        assert!(matcher.find_matches(&a, &b).is_empty());
    }

    #[test]
    fn confidence_is_the_weighted_sum_of_contributing_strategies() {
        let matcher = matcher_with(
            vec![
                Box::new(Fixed("s1", Some(1.0))),
                Box::new(Fixed("s2", Some(0.5))),
                Box::new(Fixed("s3", Some(0.0))), // scores zero: excluded
                Box::new(Fixed("s4", None)),      // abstains: excluded
            ],
            &[("s1", 0.4), ("s2", 0.4), ("s3", 0.1), ("s4", 0.1)],
            0.0,
        );
        let a = vec![event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];
        let b = vec![event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC))];

        let matches = matcher.find_matches(&a, &b);
        assert_eq!(matches.len(), 1);

        let m = &matches[0];
        // 1.0 * 0.4 + 0.5 * 0.4
        assert!((m.confidence_score - 0.6).abs() < 1e-9);
        assert_eq!(m.match_strategies, vec!["s1", "s2"]);
    }

    #[test]
    fn failing_strategy_is_skipped_not_fatal() {
        let matcher = matcher_with(
            vec![Box::new(Failing), Box::new(Fixed("ok", Some(1.0)))],
            &[("failing", 0.5), ("ok", 0.5)],
            0.0,
        );
        let a = vec![event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];
        let b = vec![event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC))];

        let matches = matcher.find_matches(&a, &b);
        assert_eq!(matches.len(), 1);
        assert!((matches[0].confidence_score - 0.5).abs() < 1e-9);
        assert_eq!(matches[0].match_strategies, vec!["ok"]);
    }

    #[test]
    fn pair_with_no_contributing_strategies_is_not_emitted() {
        let matcher = matcher_with(
            vec![Box::new(Fixed("s1", None))],
            &[("s1", 1.0)],
            0.0,
        );
        let a = vec![event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];
        let b = vec![event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC))];

        assert!(matcher.find_matches(&a, &b).is_empty());
    }

    #[test]
    fn below_threshold_pairs_are_dropped() {
        let matcher = matcher_with(
            vec![Box::new(Fixed("s1", Some(0.5)))],
            &[("s1", 1.0)],
            0.75,
        );
        let a = vec![event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];
        let b = vec![event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC))];

        assert!(matcher.find_matches(&a, &b).is_empty());
    }

    #[test]
    fn accepted_match_below_review_floor_still_requires_review() {
        // 0.8 clears the 0.75 acceptance threshold but not the 0.9 floor
        let matcher = matcher_with(
            vec![Box::new(Fixed("s1", Some(0.8)))],
            &[("s1", 1.0)],
            0.75,
        );
        let a = vec![event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];
        let b = vec![event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC))];

        let matches = matcher.find_matches(&a, &b);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].human_review_required);
    }

    #[test]
    fn confident_clean_match_skips_review() {
        let matcher = matcher_with(
            vec![Box::new(Fixed("s1", Some(0.95)))],
            &[("s1", 1.0)],
            0.75,
        );
        let a = vec![event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];
        let b = vec![event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC))];

        let matches = matcher.find_matches(&a, &b);
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].human_review_required);
        assert!(matches[0].risk_factors.is_empty());
    }

    #[test]
    fn risk_factor_forces_review_even_when_confident() {
        let matcher = matcher_with(
            vec![Box::new(Fixed("s1", Some(0.95)))],
            &[("s1", 1.0)],
            0.75,
        );
        let a = vec![event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC))];
        let mut b_event = event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));
        b_event.market_type = MarketType::MultiOutcome;

        let matches = matcher.find_matches(&a, &[b_event]);
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].risk_factors,
            vec![RiskFactor::DifferentMarketTypes]
        );
        assert!(matches[0].human_review_required);
    }

    #[test]
    fn deadline_gap_over_a_week_is_flagged() {
        let a = event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let b = event("b", "t", Venue::Predyx, datetime!(2026-03-10 00:00 UTC));

        let risks = detect_risk_factors(&a, &b);
        assert!(risks.contains(&RiskFactor::DeadlineMismatchGtWeek));
    }

    #[test]
    fn different_resolution_sources_are_flagged_only_when_both_present() {
        let mut a = event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let mut b = event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));

        // One side missing: no flag
        a.resolution_source_url = Some("https://example.com/a".parse().unwrap());
        assert!(detect_risk_factors(&a, &b).is_empty());

        // Both present and unequal: flag
        b.resolution_source_url = Some("https://example.com/b".parse().unwrap());
        assert_eq!(
            detect_risk_factors(&a, &b),
            vec![RiskFactor::DifferentResolutionSources]
        );

        // Both present and equal: no flag
        b.resolution_source_url = a.resolution_source_url.clone();
        assert!(detect_risk_factors(&a, &b).is_empty());
    }

    #[test]
    fn malformed_events_are_skipped() {
        let matcher = matcher_with(
            vec![Box::new(Fixed("s1", Some(1.0)))],
            &[("s1", 1.0)],
            0.0,
        );
        let mut bad = event("a", "t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        bad.contract_sides[0].price = dec!(1.5);
        let b = vec![event("b", "t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC))];

        assert!(matcher.find_matches(&[bad], &b).is_empty());
    }

    #[test]
    fn missing_strategy_weight_is_a_construction_error() {
        let config = MatcherConfig {
            strategy_weights: HashMap::new(),
            ..MatcherConfig::default()
        };
        let result = EventMatcher::new(vec![Box::new(Fixed("s1", Some(1.0)))], config);
        assert!(result.is_err());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let config = MatcherConfig {
            strategy_weights: HashMap::from([("s1".to_string(), -0.5)]),
            ..MatcherConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn risk_factor_display_uses_snake_case() {
        assert_eq!(
            RiskFactor::DifferentResolutionSources.to_string(),
            "different_resolution_sources"
        );
        assert_eq!(
            RiskFactor::DeadlineMismatchGtWeek.to_string(),
            "deadline_mismatch_gt_week"
        );
    }
}
