//! Cross-venue event matching.
//!
//! This module handles:
//! - Text normalization and similarity primitives
//! - The scoring-strategy registry and built-in strategies
//! - The matcher itself (weighted combination, risk factors, review gate)
//! - The thread-safe human-review queue

pub mod matcher;
pub mod review;
pub mod strategies;
pub mod text;

pub use matcher::{EventMatcher, MatchResult, MatcherConfig, RiskFactor};
pub use review::HumanReviewQueue;
pub use strategies::{default_strategies, MatchStrategy, SemanticScorer};
