//! File-backed sources reading connector-produced JSON snapshots.
//!
//! Connector processes write event and depth snapshots to disk; these
//! sources re-read them on every call so a refreshed file is picked up
//! on the next cycle without restarting the scout.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::{DepthSource, EventSource};
use crate::depth::RawLevel;
use crate::error::SourceError;
use crate::event::{Event, Venue};

/// Event source reading a JSON array of canonical events from a file.
pub struct FileEventSource {
    venue: Venue,
    path: PathBuf,
}

impl FileEventSource {
    /// Create a source for the given venue backed by a snapshot file.
    pub fn new(venue: Venue, path: impl Into<PathBuf>) -> Self {
        Self {
            venue,
            path: path.into(),
        }
    }
}

#[async_trait]
impl EventSource for FileEventSource {
    fn venue(&self) -> Venue {
        self.venue
    }

    async fn list_events(&self) -> Result<Vec<Event>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::ListFailed {
                venue: self.venue,
                reason: e.to_string(),
            })?;

        let events: Vec<Event> =
            serde_json::from_str(&raw).map_err(|e| SourceError::Parse(e.to_string()))?;

        // Snapshots may aggregate several venues; keep only ours.
        let events: Vec<Event> = events.into_iter().filter(|e| e.venue == self.venue).collect();

        debug!(venue = %self.venue, count = events.len(), "loaded event snapshot");
        Ok(events)
    }
}

/// Depth source reading a market-id -> raw-levels map from a file.
pub struct FileDepthSource {
    path: PathBuf,
}

impl FileDepthSource {
    /// Create a source backed by a depth snapshot file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DepthSource for FileDepthSource {
    async fn get_price_levels(&self, market_id: &str) -> Result<Vec<RawLevel>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::LevelsFailed {
                market_id: market_id.to_string(),
                reason: e.to_string(),
            })?;

        let mut books: HashMap<String, Vec<RawLevel>> =
            serde_json::from_str(&raw).map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(books.remove(market_id).unwrap_or_default())
    }
}
