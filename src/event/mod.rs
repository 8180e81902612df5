//! Canonical event model for cross-venue market data.
//!
//! This module handles:
//! - Venue and market-type enumerations
//! - The canonical `Event` and its tradable `ContractSide`s
//! - Well-formedness checks used to skip malformed inputs

pub mod types;

pub use types::{ContractSide, Event, MarketType, Venue};
