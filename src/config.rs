//! Application configuration loaded from environment variables.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::arbitrage::{DetectorConfig, FeeSchedule, PositionSizing};
use crate::depth::DepthConfig;
use crate::event::Venue;
use crate::matching::MatcherConfig;
use crate::matching::strategies::{
    STRATEGY_ENTITY_OVERLAP, STRATEGY_EXACT_TITLE, STRATEGY_FUZZY_TITLE,
    STRATEGY_RESOLUTION_CRITERIA, STRATEGY_SEMANTIC, STRATEGY_TEMPORAL,
};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Matching ===
    /// Minimum confidence for a match to be emitted.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Confidence below which review is always required.
    #[serde(default = "default_review_floor")]
    pub review_confidence_floor: f64,

    /// Deadline gap (days) beyond which review is required.
    #[serde(default = "default_review_gap_days")]
    pub review_deadline_gap_days: i64,

    /// Weight of the exact-title strategy.
    #[serde(default = "default_weight_exact_title")]
    pub weight_exact_title: f64,

    /// Weight of the fuzzy-title strategy.
    #[serde(default = "default_weight_fuzzy_title")]
    pub weight_fuzzy_title: f64,

    /// Weight of the entity-overlap strategy.
    #[serde(default = "default_weight_entity_overlap")]
    pub weight_entity_overlap: f64,

    /// Weight of the semantic-embedding strategy.
    #[serde(default = "default_weight_semantic")]
    pub weight_semantic_embedding: f64,

    /// Weight of the resolution-criteria strategy.
    #[serde(default = "default_weight_resolution")]
    pub weight_resolution_criteria: f64,

    /// Weight of the temporal-alignment strategy.
    #[serde(default = "default_weight_temporal")]
    pub weight_temporal_alignment: f64,

    // === Detection ===
    /// Confidence floor for economic evaluation.
    #[serde(default = "default_min_confidence")]
    pub detector_min_confidence: f64,

    /// Minimum gross edge to keep an opportunity.
    #[serde(default = "default_min_edge")]
    pub min_edge_threshold: Decimal,

    /// Maximum combined heuristic slippage.
    #[serde(default = "default_max_slippage")]
    pub max_slippage_tolerance: Decimal,

    // === Fees ===
    /// Polymarket proportional trading fee.
    #[serde(default = "default_polymarket_trading_fee")]
    pub polymarket_trading_fee: Decimal,

    /// Polymarket fixed per-trade cost (gas).
    #[serde(default = "default_polymarket_fixed_cost")]
    pub polymarket_fixed_cost: Decimal,

    /// Predyx proportional trading fee.
    #[serde(default = "default_predyx_trading_fee")]
    pub predyx_trading_fee: Decimal,

    /// Predyx fixed per-trade cost (Lightning routing).
    #[serde(default = "default_predyx_fixed_cost")]
    pub predyx_fixed_cost: Decimal,

    // === Position sizing ===
    /// Fraction of a leg's liquidity considered safe.
    #[serde(default = "default_liquidity_fraction")]
    pub position_liquidity_fraction: Decimal,

    /// Absolute position cap.
    #[serde(default = "default_hard_cap")]
    pub position_hard_cap: Decimal,

    /// Position size when liquidity is unknown.
    #[serde(default = "default_position_size")]
    pub default_position_size: Decimal,

    // === Depth analysis ===
    /// Minimum level size (dust filter).
    #[serde(default = "default_min_level_size")]
    pub min_level_size: Decimal,

    /// Depth bucket percentages (comma-separated fractions of mid).
    #[serde(default = "default_depth_buckets")]
    pub depth_bucket_pcts: Vec<Decimal>,

    /// Timeout for a single depth fetch.
    #[serde(default = "default_depth_timeout")]
    pub depth_fetch_timeout_secs: u64,

    /// Timeout for a single venue's event fetch.
    #[serde(default = "default_event_timeout")]
    pub event_fetch_timeout_secs: u64,

    // === Scheduling ===
    /// Seconds between scan cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Backoff cap for the poll interval.
    #[serde(default = "default_max_poll_interval")]
    pub max_poll_interval_secs: u64,

    /// Consecutive cycle errors before backing off.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    // === Snapshot sources ===
    /// Path to the connector-produced events snapshot.
    #[serde(default)]
    pub events_snapshot: Option<String>,

    /// Path to the connector-produced depth snapshot.
    #[serde(default)]
    pub depth_snapshot: Option<String>,

    // === Server Configuration ===
    /// HTTP server port for health/metrics endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_confidence_threshold() -> f64 {
    0.75
}

fn default_review_floor() -> f64 {
    0.9
}

fn default_review_gap_days() -> i64 {
    1
}

fn default_weight_exact_title() -> f64 {
    0.30
}

fn default_weight_fuzzy_title() -> f64 {
    0.20
}

fn default_weight_entity_overlap() -> f64 {
    0.20
}

fn default_weight_semantic() -> f64 {
    0.15
}

fn default_weight_resolution() -> f64 {
    0.10
}

fn default_weight_temporal() -> f64 {
    0.05
}

fn default_min_confidence() -> f64 {
    0.7
}

fn default_min_edge() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

fn default_max_slippage() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_polymarket_trading_fee() -> Decimal {
    Decimal::new(2, 2) // 2% on winnings
}

fn default_polymarket_fixed_cost() -> Decimal {
    Decimal::new(5, 3) // ~$5 gas per $1000
}

fn default_predyx_trading_fee() -> Decimal {
    Decimal::new(1, 2) // 1%
}

fn default_predyx_fixed_cost() -> Decimal {
    Decimal::new(1, 4) // Lightning routing
}

fn default_liquidity_fraction() -> Decimal {
    Decimal::new(1, 1) // 10%
}

fn default_hard_cap() -> Decimal {
    Decimal::new(10_000, 0)
}

fn default_position_size() -> Decimal {
    Decimal::new(100, 0)
}

fn default_min_level_size() -> Decimal {
    Decimal::TEN
}

fn default_depth_buckets() -> Vec<Decimal> {
    vec![Decimal::new(1, 2), Decimal::new(5, 2), Decimal::new(10, 2)]
}

fn default_depth_timeout() -> u64 {
    30
}

fn default_event_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    120
}

fn default_max_poll_interval() -> u64 {
    600
}

fn default_max_consecutive_errors() -> u32 {
    3
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        // envy fills every field from defaults when no vars are set
        envy::from_iter(std::iter::empty::<(String, String)>())
            .expect("default configuration is valid")
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check the configuration is valid.
    ///
    /// Misconfiguration is the only fatal condition in the pipeline and
    /// is rejected here, before anything is constructed from it.
    pub fn validate(&self) -> Result<(), String> {
        self.matcher_config().validate()?;
        self.detector_config().validate()?;

        if self.min_level_size < Decimal::ZERO {
            return Err(format!(
                "MIN_LEVEL_SIZE must be non-negative, got {}",
                self.min_level_size
            ));
        }
        for pct in &self.depth_bucket_pcts {
            if *pct <= Decimal::ZERO {
                return Err(format!("DEPTH_BUCKET_PCTS entries must be positive, got {pct}"));
            }
        }
        if self.depth_fetch_timeout_secs == 0 {
            return Err("DEPTH_FETCH_TIMEOUT_SECS must be positive".to_string());
        }
        if self.event_fetch_timeout_secs == 0 {
            return Err("EVENT_FETCH_TIMEOUT_SECS must be positive".to_string());
        }
        if self.poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be positive".to_string());
        }
        if self.max_poll_interval_secs < self.poll_interval_secs {
            return Err("MAX_POLL_INTERVAL_SECS must be >= POLL_INTERVAL_SECS".to_string());
        }
        if self.max_consecutive_errors == 0 {
            return Err("MAX_CONSECUTIVE_ERRORS must be positive".to_string());
        }

        Ok(())
    }

    /// Matcher configuration assembled from the flat fields.
    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            confidence_threshold: self.confidence_threshold,
            review_confidence_floor: self.review_confidence_floor,
            review_deadline_gap_days: self.review_deadline_gap_days,
            strategy_weights: HashMap::from([
                (STRATEGY_EXACT_TITLE.to_string(), self.weight_exact_title),
                (STRATEGY_FUZZY_TITLE.to_string(), self.weight_fuzzy_title),
                (STRATEGY_ENTITY_OVERLAP.to_string(), self.weight_entity_overlap),
                (STRATEGY_SEMANTIC.to_string(), self.weight_semantic_embedding),
                (
                    STRATEGY_RESOLUTION_CRITERIA.to_string(),
                    self.weight_resolution_criteria,
                ),
                (STRATEGY_TEMPORAL.to_string(), self.weight_temporal_alignment),
            ]),
        }
    }

    /// Detector configuration with the typed per-venue fee schedules.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            min_confidence: self.detector_min_confidence,
            min_edge_threshold: self.min_edge_threshold,
            max_slippage_tolerance: self.max_slippage_tolerance,
            fees: HashMap::from([
                (
                    Venue::Polymarket,
                    FeeSchedule {
                        trading_fee_rate: self.polymarket_trading_fee,
                        fixed_cost: self.polymarket_fixed_cost,
                    },
                ),
                (
                    Venue::Predyx,
                    FeeSchedule {
                        trading_fee_rate: self.predyx_trading_fee,
                        fixed_cost: self.predyx_fixed_cost,
                    },
                ),
            ]),
            sizing: PositionSizing {
                liquidity_fraction: self.position_liquidity_fraction,
                hard_cap: self.position_hard_cap,
                default_size: self.default_position_size,
            },
        }
    }

    /// Depth-analysis configuration.
    pub fn depth_config(&self) -> DepthConfig {
        DepthConfig {
            min_level_size: self.min_level_size,
            depth_bucket_pcts: self.depth_bucket_pcts.clone(),
            fetch_timeout_secs: self.depth_fetch_timeout_secs,
        }
    }
}
