//! Mock sources for unit and integration testing.
//!
//! These mirror the real source traits without any I/O, with
//! configurable failures for exercising error paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{DepthSource, EventSource};
use crate::depth::RawLevel;
use crate::error::SourceError;
use crate::event::{Event, Venue};

/// Configuration for mock source behavior.
#[derive(Debug, Clone, Default)]
pub struct MockSourceConfig {
    /// Whether event listings should fail.
    pub fail_events: bool,
    /// Whether level fetches should fail.
    pub fail_levels: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// Mock event source serving canned events for one venue.
#[derive(Clone)]
pub struct MockEventSource {
    venue: Venue,
    config: MockSourceConfig,
    events: Arc<Mutex<Vec<Event>>>,
}

impl MockEventSource {
    /// Create an empty mock source for the given venue.
    pub fn new(venue: Venue) -> Self {
        Self {
            venue,
            config: MockSourceConfig::default(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock source with custom behavior.
    pub fn with_config(venue: Venue, config: MockSourceConfig) -> Self {
        Self {
            venue,
            config,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the canned events.
    pub fn set_events(&self, events: Vec<Event>) {
        *self.events.lock().unwrap() = events;
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    fn venue(&self) -> Venue {
        self.venue
    }

    async fn list_events(&self) -> Result<Vec<Event>, SourceError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
        if self.config.fail_events {
            return Err(SourceError::ListFailed {
                venue: self.venue,
                reason: "mock failure".to_string(),
            });
        }
        Ok(self.events.lock().unwrap().clone())
    }
}

/// Mock depth source serving canned raw levels per market.
#[derive(Clone, Default)]
pub struct MockDepthSource {
    config: MockSourceConfig,
    levels: Arc<Mutex<HashMap<String, Vec<RawLevel>>>>,
}

impl MockDepthSource {
    /// Create an empty mock depth source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock depth source with custom behavior.
    pub fn with_config(config: MockSourceConfig) -> Self {
        Self {
            config,
            levels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Set the raw levels for a market.
    pub fn set_levels(&self, market_id: impl Into<String>, levels: Vec<RawLevel>) {
        self.levels.lock().unwrap().insert(market_id.into(), levels);
    }
}

#[async_trait]
impl DepthSource for MockDepthSource {
    async fn get_price_levels(&self, market_id: &str) -> Result<Vec<RawLevel>, SourceError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
        if self.config.fail_levels {
            return Err(SourceError::LevelsFailed {
                market_id: market_id.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        Ok(self
            .levels
            .lock()
            .unwrap()
            .get(market_id)
            .cloned()
            .unwrap_or_default())
    }
}
