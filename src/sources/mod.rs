//! External source interfaces consumed by the pipeline.
//!
//! Venue connectors live outside this crate; the pipeline only sees the
//! `EventSource` and `DepthSource` traits. This module provides:
//! - The source traits themselves
//! - File-backed sources reading connector-produced JSON snapshots
//! - Mock sources for testing

pub mod file;
pub mod mock;

use async_trait::async_trait;

use crate::depth::RawLevel;
use crate::error::SourceError;
use crate::event::{Event, Venue};

pub use file::{FileEventSource, FileDepthSource};
pub use mock::{MockDepthSource, MockEventSource};

/// Supplies canonical events for one venue.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// The venue this source lists.
    fn venue(&self) -> Venue;

    /// List the venue's current events, already normalized.
    async fn list_events(&self) -> Result<Vec<Event>, SourceError>;
}

/// Supplies raw order-book levels for a market.
#[async_trait]
pub trait DepthSource: Send + Sync {
    /// Fetch raw, unsorted price levels for the given market.
    async fn get_price_levels(&self, market_id: &str) -> Result<Vec<RawLevel>, SourceError>;
}
