//! Building depth analyses from raw order-book levels.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use super::types::{DepthBucket, OrderbookDepth, PriceLevel, RawLevel, Side};
use crate::error::{DepthError, SourceError};
use crate::sources::DepthSource;

/// Configuration for depth analysis.
#[derive(Debug, Clone)]
pub struct DepthConfig {
    /// Minimum size for a level to be considered (dust filter).
    pub min_level_size: Decimal,
    /// Percentage bands (fractions of mid) for depth bucketing.
    pub depth_bucket_pcts: Vec<Decimal>,
    /// Deadline for a single price-level fetch.
    pub fetch_timeout_secs: u64,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            min_level_size: Decimal::TEN,
            depth_bucket_pcts: vec![
                Decimal::new(1, 2),  // 1%
                Decimal::new(5, 2),  // 5%
                Decimal::new(10, 2), // 10%
            ],
            fetch_timeout_secs: 30,
        }
    }
}

/// Analyzes market depth via an injected depth source.
pub struct MarketDepthAnalyzer {
    source: Arc<dyn DepthSource>,
    config: DepthConfig,
}

impl MarketDepthAnalyzer {
    /// Create an analyzer over the given source.
    pub fn new(source: Arc<dyn DepthSource>, config: DepthConfig) -> Self {
        Self { source, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DepthConfig {
        &self.config
    }

    /// Fetch raw levels and build a complete depth analysis.
    ///
    /// A source that returns an empty level list yields an empty book;
    /// a source *failure* propagates as an error so callers never read
    /// a failed fetch as zero liquidity.
    #[instrument(skip(self))]
    pub async fn get_market_depth(&self, market_id: &str) -> Result<OrderbookDepth, DepthError> {
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        let raw = tokio::time::timeout(timeout, self.source.get_price_levels(market_id))
            .await
            .map_err(|_| SourceError::Timeout {
                timeout_secs: self.config.fetch_timeout_secs,
            })??;

        if raw.is_empty() {
            warn!(market_id, "no order book levels returned");
            return Ok(OrderbookDepth::empty(market_id));
        }

        Ok(build_depth(market_id, &raw, &self.config))
    }
}

/// Build an `OrderbookDepth` from raw levels.
///
/// Pure transform: filters dust, sorts bids descending / asks ascending,
/// attaches cumulative sizes, and derives every aggregate metric.
pub fn build_depth(market_id: &str, raw: &[RawLevel], config: &DepthConfig) -> OrderbookDepth {
    let mut bids: Vec<(Decimal, Decimal)> = Vec::new();
    let mut asks: Vec<(Decimal, Decimal)> = Vec::new();

    for level in raw {
        if level.size < config.min_level_size {
            continue;
        }
        match level.side {
            Side::Buy => bids.push((level.price, level.size)),
            Side::Sell => asks.push((level.price, level.size)),
        }
    }

    bids.sort_by(|a, b| b.0.cmp(&a.0));
    asks.sort_by(|a, b| a.0.cmp(&b.0));

    let bid_levels = with_cumulative(bids);
    let ask_levels = with_cumulative(asks);

    let best_bid = bid_levels.first().map(|l| l.price);
    let best_ask = ask_levels.first().map(|l| l.price);

    let mid_price = match (best_bid, best_ask) {
        (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
        _ => None,
    };
    let spread = match (best_bid, best_ask) {
        (Some(bid), Some(ask)) => Some(ask - bid),
        _ => None,
    };
    let spread_percentage = match (spread, mid_price) {
        (Some(s), Some(mid)) if !mid.is_zero() => Some(s / mid),
        _ => None,
    };

    let total_bid_depth: Decimal = bid_levels.iter().map(|l| l.size).sum();
    let total_ask_depth: Decimal = ask_levels.iter().map(|l| l.size).sum();

    let total_depth = total_bid_depth + total_ask_depth;
    let depth_imbalance = if total_depth.is_zero() {
        None
    } else {
        Some((total_bid_depth - total_ask_depth) / total_depth)
    };

    let depth_within = match mid_price {
        Some(mid) => config
            .depth_bucket_pcts
            .iter()
            .map(|&pct| DepthBucket {
                pct,
                depth: depth_within_pct(&bid_levels, &ask_levels, mid, pct),
            })
            .collect(),
        None => Vec::new(),
    };

    OrderbookDepth {
        market_id: market_id.to_string(),
        best_bid,
        best_ask,
        spread,
        spread_percentage,
        mid_price,
        bid_levels,
        ask_levels,
        total_bid_depth,
        total_ask_depth,
        depth_imbalance,
        depth_within,
    }
}

/// Attach running cumulative sizes, producing a new immutable sequence.
fn with_cumulative(levels: Vec<(Decimal, Decimal)>) -> Vec<PriceLevel> {
    let mut cumulative = Decimal::ZERO;
    levels
        .into_iter()
        .map(|(price, size)| {
            cumulative += size;
            PriceLevel {
                price,
                size,
                cumulative_size: cumulative,
            }
        })
        .collect()
}

/// Total size whose price lies within `mid * pct` of mid, both sides.
fn depth_within_pct(
    bids: &[PriceLevel],
    asks: &[PriceLevel],
    mid: Decimal,
    pct: Decimal,
) -> Decimal {
    let band = mid * pct;
    let bid_depth: Decimal = bids
        .iter()
        .filter(|l| mid - l.price <= band)
        .map(|l| l.size)
        .sum();
    let ask_depth: Decimal = asks
        .iter()
        .filter(|l| l.price - mid <= band)
        .map(|l| l.size)
        .sum();
    bid_depth + ask_depth
}
