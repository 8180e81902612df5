//! Scoring strategies for cross-venue event matching.
//!
//! Each strategy is an independent component behind [`MatchStrategy`];
//! the matcher combines their scores with configured weights. A strategy
//! may abstain (`Ok(None)`) when its inputs are missing, which is
//! different from scoring zero and different from failing.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::StrategyError;
use crate::event::Event;

use super::text::{jaccard, normalize, similarity_ratio, token_set};

// Strategy name constants, used for weight configuration.

/// Exact-title strategy name.
pub const STRATEGY_EXACT_TITLE: &str = "exact_title";
/// Fuzzy (edit-distance) title strategy name.
pub const STRATEGY_FUZZY_TITLE: &str = "fuzzy_title";
/// Entity-overlap strategy name.
pub const STRATEGY_ENTITY_OVERLAP: &str = "entity_overlap";
/// Semantic-embedding strategy name.
pub const STRATEGY_SEMANTIC: &str = "semantic_embedding";
/// Resolution-criteria strategy name.
pub const STRATEGY_RESOLUTION_CRITERIA: &str = "resolution_criteria";
/// Temporal-alignment strategy name.
pub const STRATEGY_TEMPORAL: &str = "temporal_alignment";

/// One independent scoring component.
pub trait MatchStrategy: Send + Sync {
    /// Stable name used for weighting and reporting.
    fn name(&self) -> &'static str;

    /// Score how likely the two events describe the same outcome.
    ///
    /// `Ok(Some(score))` with score in [0, 1]; `Ok(None)` to abstain.
    fn score(&self, a: &Event, b: &Event) -> Result<Option<f64>, StrategyError>;
}

/// Injected semantic-similarity capability.
///
/// The embedding model behind it is the caller's concern (load once,
/// reuse); the matcher only ever sees this interface.
pub trait SemanticScorer: Send + Sync {
    /// Similarity of two texts in [0, 1].
    fn similarity(&self, a: &str, b: &str) -> Result<f64, StrategyError>;
}

/// Exact match on normalized titles.
pub struct ExactTitleStrategy;

impl MatchStrategy for ExactTitleStrategy {
    fn name(&self) -> &'static str {
        STRATEGY_EXACT_TITLE
    }

    fn score(&self, a: &Event, b: &Event) -> Result<Option<f64>, StrategyError> {
        let norm_a = normalize(&a.title);
        let norm_b = normalize(&b.title);
        if norm_a.is_empty() || norm_b.is_empty() {
            return Ok(None);
        }
        Ok(Some(if norm_a == norm_b { 1.0 } else { 0.0 }))
    }
}

/// Normalized edit-distance similarity on titles.
pub struct FuzzyTitleStrategy;

impl MatchStrategy for FuzzyTitleStrategy {
    fn name(&self) -> &'static str {
        STRATEGY_FUZZY_TITLE
    }

    fn score(&self, a: &Event, b: &Event) -> Result<Option<f64>, StrategyError> {
        let norm_a = normalize(&a.title);
        let norm_b = normalize(&b.title);
        if norm_a.is_empty() || norm_b.is_empty() {
            return Ok(None);
        }
        Ok(Some(similarity_ratio(&norm_a, &norm_b)))
    }
}

/// Overlap of the events' named-entity sets.
pub struct EntityOverlapStrategy;

impl MatchStrategy for EntityOverlapStrategy {
    fn name(&self) -> &'static str {
        STRATEGY_ENTITY_OVERLAP
    }

    fn score(&self, a: &Event, b: &Event) -> Result<Option<f64>, StrategyError> {
        let set_a: HashSet<String> = a.entities.iter().map(|e| e.to_lowercase()).collect();
        let set_b: HashSet<String> = b.entities.iter().map(|e| e.to_lowercase()).collect();
        Ok(jaccard(&set_a, &set_b))
    }
}

/// Semantic similarity via the injected scorer.
pub struct SemanticEmbeddingStrategy {
    scorer: Arc<dyn SemanticScorer>,
}

impl SemanticEmbeddingStrategy {
    /// Wrap an injected scorer.
    pub fn new(scorer: Arc<dyn SemanticScorer>) -> Self {
        Self { scorer }
    }
}

impl MatchStrategy for SemanticEmbeddingStrategy {
    fn name(&self) -> &'static str {
        STRATEGY_SEMANTIC
    }

    fn score(&self, a: &Event, b: &Event) -> Result<Option<f64>, StrategyError> {
        let score = self.scorer.similarity(&a.title, &b.title)?;
        Ok(Some(score.clamp(0.0, 1.0)))
    }
}

/// Token overlap of the resolution-criteria texts.
pub struct ResolutionCriteriaStrategy;

impl MatchStrategy for ResolutionCriteriaStrategy {
    fn name(&self) -> &'static str {
        STRATEGY_RESOLUTION_CRITERIA
    }

    fn score(&self, a: &Event, b: &Event) -> Result<Option<f64>, StrategyError> {
        let tokens_a = token_set(&a.resolution_criteria);
        let tokens_b = token_set(&b.resolution_criteria);
        Ok(jaccard(&tokens_a, &tokens_b))
    }
}

/// Deadline alignment: 1.0 for identical deadlines, linearly down to
/// 0 at a week apart.
pub struct TemporalAlignmentStrategy;

impl MatchStrategy for TemporalAlignmentStrategy {
    fn name(&self) -> &'static str {
        STRATEGY_TEMPORAL
    }

    fn score(&self, a: &Event, b: &Event) -> Result<Option<f64>, StrategyError> {
        let gap_hours = (a.deadline - b.deadline).whole_hours().abs() as f64;
        let gap_days = gap_hours / 24.0;
        Ok(Some((1.0 - gap_days / 7.0).clamp(0.0, 1.0)))
    }
}

/// The standard strategy set, in canonical weight order.
///
/// The semantic strategy is only registered when a scorer is supplied.
pub fn default_strategies(
    semantic_scorer: Option<Arc<dyn SemanticScorer>>,
) -> Vec<Box<dyn MatchStrategy>> {
    let mut strategies: Vec<Box<dyn MatchStrategy>> = vec![
        Box::new(ExactTitleStrategy),
        Box::new(FuzzyTitleStrategy),
        Box::new(EntityOverlapStrategy),
    ];
    if let Some(scorer) = semantic_scorer {
        strategies.push(Box::new(SemanticEmbeddingStrategy::new(scorer)));
    }
    strategies.push(Box::new(ResolutionCriteriaStrategy));
    strategies.push(Box::new(TemporalAlignmentStrategy));
    strategies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ContractSide, MarketType, Venue};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn event(title: &str, venue: Venue, deadline: OffsetDateTime) -> Event {
        Event {
            event_id: format!("{venue}-{title}"),
            source_ids: HashMap::new(),
            title: title.to_string(),
            entities: vec!["BTC".to_string(), "March".to_string()],
            category: "crypto".to_string(),
            resolution_criteria: "Settles YES if BTC closes above 100000 USD".to_string(),
            resolution_source_url: None,
            deadline,
            venue,
            market_type: MarketType::Binary,
            contract_sides: vec![ContractSide {
                side_id: "yes".to_string(),
                name: "YES".to_string(),
                price: dec!(0.5),
                implied_probability: dec!(0.5),
                volume_24h: None,
                liquidity: None,
            }],
            total_volume: None,
            created_at: datetime!(2026-01-01 00:00 UTC),
            updated_at: datetime!(2026-01-01 00:00 UTC),
        }
    }

    #[test]
    fn exact_title_matches_modulo_normalization() {
        let a = event("Will BTC close above $100,000?", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let b = event("will btc close above 100,000", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));

        assert_eq!(ExactTitleStrategy.score(&a, &b).unwrap(), Some(1.0));
    }

    #[test]
    fn exact_title_scores_zero_on_mismatch() {
        let a = event("Will BTC close above $100,000?", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let b = event("Will ETH flip BTC?", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));

        assert_eq!(ExactTitleStrategy.score(&a, &b).unwrap(), Some(0.0));
    }

    #[test]
    fn fuzzy_title_scores_similar_titles_high() {
        let a = event("Will BTC close above $100,000?", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let b = event("Will BTC close above $100,000 USD?", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));

        let score = FuzzyTitleStrategy.score(&a, &b).unwrap().unwrap();
        assert!(score > 0.8);
    }

    #[test]
    fn entity_overlap_abstains_without_entities() {
        let mut a = event("t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let b = event("t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));
        a.entities.clear();

        assert_eq!(EntityOverlapStrategy.score(&a, &b).unwrap(), None);
    }

    #[test]
    fn entity_overlap_is_case_insensitive() {
        let mut a = event("t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let b = event("t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));
        a.entities = vec!["btc".to_string(), "march".to_string()];

        assert_eq!(EntityOverlapStrategy.score(&a, &b).unwrap(), Some(1.0));
    }

    #[test]
    fn temporal_alignment_decays_with_gap() {
        let a = event("t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let same = event("t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));
        let far = event("t", Venue::Predyx, datetime!(2026-03-15 00:00 UTC));

        assert_eq!(TemporalAlignmentStrategy.score(&a, &same).unwrap(), Some(1.0));
        assert_eq!(TemporalAlignmentStrategy.score(&a, &far).unwrap(), Some(0.0));
    }

    #[test]
    fn semantic_strategy_uses_injected_scorer() {
        struct FixedScorer(f64);
        impl SemanticScorer for FixedScorer {
            fn similarity(&self, _: &str, _: &str) -> Result<f64, StrategyError> {
                Ok(self.0)
            }
        }

        let strategy = SemanticEmbeddingStrategy::new(Arc::new(FixedScorer(0.87)));
        let a = event("t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let b = event("t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));

        assert_eq!(strategy.score(&a, &b).unwrap(), Some(0.87));
    }

    #[test]
    fn semantic_strategy_propagates_scorer_errors() {
        struct FailingScorer;
        impl SemanticScorer for FailingScorer {
            fn similarity(&self, _: &str, _: &str) -> Result<f64, StrategyError> {
                Err(StrategyError::Scorer("model not loaded".to_string()))
            }
        }

        let strategy = SemanticEmbeddingStrategy::new(Arc::new(FailingScorer));
        let a = event("t", Venue::Polymarket, datetime!(2026-03-01 00:00 UTC));
        let b = event("t", Venue::Predyx, datetime!(2026-03-01 00:00 UTC));

        assert!(strategy.score(&a, &b).is_err());
    }

    #[test]
    fn default_registry_size_depends_on_scorer() {
        assert_eq!(default_strategies(None).len(), 5);

        struct FixedScorer;
        impl SemanticScorer for FixedScorer {
            fn similarity(&self, _: &str, _: &str) -> Result<f64, StrategyError> {
                Ok(1.0)
            }
        }
        assert_eq!(default_strategies(Some(Arc::new(FixedScorer))).len(), 6);
    }
}
