//! Order-book depth types and data structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Side of the book or of a simulated trade.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    /// Resting buy order (bid) or a simulated buy.
    Buy,
    /// Resting sell order (ask) or a simulated sell.
    Sell,
}

impl Side {
    /// The opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// One raw, unsorted order-book entry as delivered by a depth source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawLevel {
    /// Level price.
    pub price: Decimal,
    /// Which side the resting orders are on.
    pub side: Side,
    /// Total size resting at this price.
    pub size: Decimal,
}

/// Single price level with its running total from the best price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLevel {
    /// Price at this level.
    pub price: Decimal,
    /// Total size available at this price.
    pub size: Decimal,
    /// Cumulative size from the best price down to this level.
    pub cumulative_size: Decimal,
}

/// Depth available within a percentage band of the mid price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepthBucket {
    /// Band width as a fraction of mid (0.01 = 1%).
    pub pct: Decimal,
    /// Total size (both sides) whose price lies within the band.
    pub depth: Decimal,
}

/// Complete depth analysis for one market, replaced wholesale per fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderbookDepth {
    /// Market this book belongs to.
    pub market_id: String,

    /// Best bid price, if any bid survived the dust filter.
    pub best_bid: Option<Decimal>,
    /// Best ask price, if any ask survived the dust filter.
    pub best_ask: Option<Decimal>,
    /// Absolute spread (ask − bid), requires both quotes.
    pub spread: Option<Decimal>,
    /// Spread as a fraction of mid, requires both quotes.
    pub spread_percentage: Option<Decimal>,
    /// Average of best bid and ask, requires both quotes.
    pub mid_price: Option<Decimal>,

    /// Bid levels sorted by price descending, with cumulative sizes.
    pub bid_levels: Vec<PriceLevel>,
    /// Ask levels sorted by price ascending, with cumulative sizes.
    pub ask_levels: Vec<PriceLevel>,

    /// Sum of all bid sizes.
    pub total_bid_depth: Decimal,
    /// Sum of all ask sizes.
    pub total_ask_depth: Decimal,
    /// (bids − asks) / (bids + asks); absent when total depth is zero.
    pub depth_imbalance: Option<Decimal>,

    /// Depth within configured percentage bands of mid (absent without mid).
    pub depth_within: Vec<DepthBucket>,
}

impl OrderbookDepth {
    /// An empty book for a market with no usable data.
    pub fn empty(market_id: impl Into<String>) -> Self {
        Self {
            market_id: market_id.into(),
            best_bid: None,
            best_ask: None,
            spread: None,
            spread_percentage: None,
            mid_price: None,
            bid_levels: Vec::new(),
            ask_levels: Vec::new(),
            total_bid_depth: Decimal::ZERO,
            total_ask_depth: Decimal::ZERO,
            depth_imbalance: None,
            depth_within: Vec::new(),
        }
    }

    /// Levels consumed by a trade on the given side (buys eat asks).
    pub fn consuming_levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Buy => &self.ask_levels,
            Side::Sell => &self.bid_levels,
        }
    }

    /// Best quote a trade on the given side would start from.
    pub fn expected_price(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Buy => self.best_ask,
            Side::Sell => self.best_bid,
        }
    }

    /// Total depth on the side a trade would consume.
    pub fn consumable_depth(&self, side: Side) -> Decimal {
        match side {
            Side::Buy => self.total_ask_depth,
            Side::Sell => self.total_bid_depth,
        }
    }
}

/// Simulated execution of a single-market trade against the book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlippageEstimate {
    /// Market the simulation ran against.
    pub market_id: String,
    /// Direction of the simulated trade.
    pub side: Side,
    /// Requested trade size.
    pub nominal_size: Decimal,

    /// Size-weighted average price actually paid/received.
    pub average_fill_price: Option<Decimal>,
    /// Best-quote price the trade would start from.
    pub expected_fill_price: Option<Decimal>,
    /// |average − expected|.
    pub slippage_absolute: Option<Decimal>,
    /// Absolute slippage as a fraction of the expected price.
    pub slippage_percentage: Option<Decimal>,

    /// |average − mid| / mid; deviation from fair value, not from quote.
    pub price_impact: Option<Decimal>,
    /// Filled size as a fraction of total consumable depth.
    pub liquidity_consumed: Option<Decimal>,

    /// True only if the full requested size filled.
    pub can_execute: bool,
    /// Filled size; the ceiling on safe trade size when partial.
    pub max_executable_size: Option<Decimal>,
    /// True when the walk ran out of levels before filling.
    pub depth_exhausted: bool,

    /// (price, size) pairs consumed, in walk order.
    pub levels_consumed: Vec<(Decimal, Decimal)>,
}

impl SlippageEstimate {
    /// A neutral estimate for a trade that could not be simulated.
    pub fn unfillable(market_id: impl Into<String>, side: Side, nominal_size: Decimal) -> Self {
        Self {
            market_id: market_id.into(),
            side,
            nominal_size,
            average_fill_price: None,
            expected_fill_price: None,
            slippage_absolute: None,
            slippage_percentage: None,
            price_impact: None,
            liquidity_consumed: None,
            can_execute: false,
            max_executable_size: None,
            depth_exhausted: false,
            levels_consumed: Vec::new(),
        }
    }
}

/// Slippage estimates for both legs of a cross-venue arbitrage.
///
/// The buy leg is always assigned to the venue with the cheaper mid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageLegs {
    /// Simulated buy on the cheaper venue.
    pub buy_leg: SlippageEstimate,
    /// Simulated sell on the dearer venue.
    pub sell_leg: SlippageEstimate,
    /// Market bought on.
    pub buy_venue: String,
    /// Market sold on.
    pub sell_venue: String,
}

/// Verdict on whether a candidate arbitrage survives real execution costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityAssessment {
    /// True when every constraint passed.
    pub feasible: bool,
    /// Largest size executable on both legs.
    pub max_size: Decimal,
    /// Sum of both legs' slippage percentages.
    pub total_slippage: Decimal,
    /// Edge from average fill prices, net of slippage; absent when either
    /// leg produced no fill price.
    pub net_edge_after_slippage: Option<Decimal>,
    /// Human-readable description of every failed constraint.
    pub constraints: Vec<String>,
}
