//! Canonical types for events normalized from venue-specific market data.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;
use url::Url;

/// A trading venue hosting prediction markets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Venue {
    /// Polymarket (Polygon CLOB).
    Polymarket,
    /// Predyx (Lightning-settled).
    Predyx,
    /// Stacker News (signal source, occasionally tradable).
    StackerNews,
}

/// Structure of the market's outcome space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarketType {
    /// Two complementary outcomes (YES/NO).
    Binary,
    /// More than two mutually exclusive outcomes.
    MultiOutcome,
    /// Scalar/continuous settlement.
    Continuous,
}

/// One tradable outcome of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSide {
    /// Venue-scoped identifier for this side.
    pub side_id: String,
    /// Outcome name ("YES", "NO", or a specific outcome).
    pub name: String,
    /// Current price.
    pub price: Decimal,
    /// Probability implied by the price.
    pub implied_probability: Decimal,
    /// Trailing 24h volume, if the venue reports it.
    #[serde(default)]
    pub volume_24h: Option<Decimal>,
    /// Available liquidity, if the venue reports it.
    #[serde(default)]
    pub liquidity: Option<Decimal>,
}

/// Canonical representation of a predictable event on one venue.
///
/// Events are produced by the normalization layer, read-only to the
/// pipeline, and superseded wholesale on refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Internal canonical ID.
    pub event_id: String,
    /// Venue name -> venue market ID mapping.
    pub source_ids: HashMap<String, String>,
    /// Market title/question.
    pub title: String,
    /// Named entities mentioned (people, orgs, assets).
    #[serde(default)]
    pub entities: Vec<String>,
    /// Coarse category tag.
    #[serde(default)]
    pub category: String,
    /// Plain-text resolution criteria.
    #[serde(default)]
    pub resolution_criteria: String,
    /// URL of the authoritative resolution source, if stated.
    #[serde(default)]
    pub resolution_source_url: Option<Url>,
    /// Resolution deadline.
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
    /// Venue hosting this listing.
    pub venue: Venue,
    /// Outcome-space structure.
    pub market_type: MarketType,
    /// Ordered tradable sides.
    pub contract_sides: Vec<ContractSide>,
    /// Total traded volume, if reported.
    #[serde(default)]
    pub total_volume: Option<Decimal>,
    /// When this snapshot was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When this snapshot was last refreshed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Event {
    /// Get the venue-specific market ID for this event's venue.
    pub fn source_id(&self) -> Option<&str> {
        self.source_ids.get(&self.venue.to_string()).map(String::as_str)
    }

    /// Find the contract side matching the given name (case-insensitive).
    pub fn contract_side(&self, name: &str) -> Option<&ContractSide> {
        self.contract_sides
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Absolute deadline gap to another event in whole days.
    pub fn deadline_gap_days(&self, other: &Event) -> i64 {
        (self.deadline - other.deadline).whole_days().abs()
    }

    /// Check the structural invariants: unique side names, and for binary
    /// markets all prices in [0, 1].
    ///
    /// Malformed events are skipped by the pipeline, never fatal.
    pub fn is_well_formed(&self) -> bool {
        let mut names = HashSet::new();
        for side in &self.contract_sides {
            if !names.insert(side.name.to_ascii_uppercase()) {
                return false;
            }
            if self.market_type == MarketType::Binary
                && (side.price < Decimal::ZERO || side.price > Decimal::ONE)
            {
                return false;
            }
        }
        true
    }
}
