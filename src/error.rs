//! Unified error types for the arbitrage scout.

use thiserror::Error;

use crate::event::Venue;

/// Unified error type for the arbitrage scout.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Event or depth source error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Depth analysis error.
    #[error("depth error: {0}")]
    Depth(#[from] DepthError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from external event/depth sources.
///
/// These are retried with backoff by the caller and never silently
/// interpreted as empty markets or zero liquidity.
#[derive(Error, Debug)]
pub enum SourceError {
    /// A venue's event listing could not be fetched.
    #[error("failed to list events for {venue}: {reason}")]
    ListFailed {
        /// Venue that failed.
        venue: Venue,
        /// Reason for failure.
        reason: String,
    },

    /// Raw price levels for a market could not be fetched.
    #[error("failed to fetch price levels for {market_id}: {reason}")]
    LevelsFailed {
        /// Market that failed.
        market_id: String,
        /// Reason for failure.
        reason: String,
    },

    /// The fetch did not complete within its deadline.
    #[error("source request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Snapshot data could not be parsed.
    #[error("failed to parse source data: {0}")]
    Parse(String),
}

/// Errors from depth analysis.
#[derive(Error, Debug)]
pub enum DepthError {
    /// The source returned no usable levels for the market.
    #[error("no order book data for market {market_id}")]
    NoData {
        /// Market with no data.
        market_id: String,
    },

    /// Underlying source failure.
    #[error("depth source error: {0}")]
    Source(#[from] SourceError),
}

/// A single scoring strategy failed.
///
/// Strategy failures are logged and skipped; they never abort the
/// evaluation of a pair.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// The injected semantic scorer failed.
    #[error("semantic scorer error: {0}")]
    Scorer(String),

    /// The strategy could not run on these inputs.
    #[error("strategy failed: {0}")]
    Failed(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ScoutError>;
