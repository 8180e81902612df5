//! Level-walk slippage simulation and two-leg feasibility assessment.

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use super::types::{ArbitrageLegs, FeasibilityAssessment, OrderbookDepth, Side, SlippageEstimate};

/// Simulate filling `size` on the given side against the book.
///
/// Walks the consuming side's levels in priority order, greedily filling
/// each up to its size. A partial fill is not an error: `can_execute` is
/// false, `depth_exhausted` is true, and `max_executable_size` is the
/// ceiling on safe trade size.
#[instrument(skip(depth), fields(market = %depth.market_id))]
pub fn calculate_slippage(depth: &OrderbookDepth, side: Side, size: Decimal) -> SlippageEstimate {
    let mut estimate = SlippageEstimate::unfillable(&depth.market_id, side, size);

    let levels = depth.consuming_levels(side);
    let expected_price = depth.expected_price(side);

    let expected_price = match expected_price {
        Some(p) if !levels.is_empty() => p,
        _ => {
            warn!(side = %side, "no levels available for slippage estimate");
            return estimate;
        }
    };

    estimate.expected_fill_price = Some(expected_price);

    let mut remaining = size;
    let mut total_cost = Decimal::ZERO;
    let mut levels_consumed = Vec::new();

    for level in levels {
        if remaining <= Decimal::ZERO {
            break;
        }
        let fill = remaining.min(level.size);
        total_cost += fill * level.price;
        levels_consumed.push((level.price, fill));
        remaining -= fill;
    }

    if total_cost > Decimal::ZERO {
        let filled = size - remaining;
        let average = total_cost / filled;

        estimate.average_fill_price = Some(average);
        estimate.levels_consumed = levels_consumed;
        estimate.can_execute = remaining.is_zero();
        estimate.max_executable_size = Some(filled);
        estimate.depth_exhausted = remaining > Decimal::ZERO;

        estimate.slippage_absolute = Some((average - expected_price).abs());
        if !expected_price.is_zero() {
            estimate.slippage_percentage =
                Some((average - expected_price).abs() / expected_price);
        }

        if let Some(mid) = depth.mid_price {
            if !mid.is_zero() {
                estimate.price_impact = Some((average - mid).abs() / mid);
            }
        }

        let available = depth.consumable_depth(side);
        if available > Decimal::ZERO {
            estimate.liquidity_consumed = Some(filled / available);
        }
    }

    estimate
}

/// Simulate both legs of a cross-venue arbitrage of the given size.
///
/// Buys on whichever venue has the cheaper mid and sells on the dearer
/// one, regardless of argument order. Returns `None` when either mid is
/// unavailable, since leg assignment would be arbitrary.
pub fn calculate_arbitrage_slippage(
    depth_a: &OrderbookDepth,
    depth_b: &OrderbookDepth,
    size: Decimal,
) -> Option<ArbitrageLegs> {
    let (mid_a, mid_b) = match (depth_a.mid_price, depth_b.mid_price) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            warn!(
                market_a = %depth_a.market_id,
                market_b = %depth_b.market_id,
                "cannot assign arbitrage legs without both mid prices"
            );
            return None;
        }
    };

    let (cheap, dear) = if mid_a < mid_b {
        (depth_a, depth_b)
    } else {
        (depth_b, depth_a)
    };

    Some(ArbitrageLegs {
        buy_leg: calculate_slippage(cheap, Side::Buy, size),
        sell_leg: calculate_slippage(dear, Side::Sell, size),
        buy_venue: cheap.market_id.clone(),
        sell_venue: dear.market_id.clone(),
    })
}

/// Assess whether a two-leg arbitrage survives real execution costs.
///
/// Every failed condition appends a distinct constraint rather than
/// failing fast; callers need the full list to decide whether to retry
/// at a smaller size. The net edge uses the legs' *average fill prices*,
/// not quotes, so the verdict reflects what would actually be paid.
pub fn assess_arbitrage_feasibility(
    legs: &ArbitrageLegs,
    target_edge: Decimal,
    max_slippage: Decimal,
) -> FeasibilityAssessment {
    let mut constraints = Vec::new();

    let buy = &legs.buy_leg;
    let sell = &legs.sell_leg;

    if !buy.can_execute {
        constraints.push(format!(
            "buy leg cannot execute full size (max: {})",
            fmt_opt(buy.max_executable_size)
        ));
    }
    if !sell.can_execute {
        constraints.push(format!(
            "sell leg cannot execute full size (max: {})",
            fmt_opt(sell.max_executable_size)
        ));
    }

    let max_size = match (buy.max_executable_size, sell.max_executable_size) {
        (Some(b), Some(s)) => b.min(s),
        _ => Decimal::ZERO,
    };

    let buy_slippage = buy.slippage_percentage.unwrap_or(Decimal::ZERO);
    let sell_slippage = sell.slippage_percentage.unwrap_or(Decimal::ZERO);
    let total_slippage = buy_slippage + sell_slippage;

    if buy_slippage > max_slippage {
        constraints.push(format!(
            "buy leg slippage too high: {buy_slippage} > {max_slippage}"
        ));
    }
    if sell_slippage > max_slippage {
        constraints.push(format!(
            "sell leg slippage too high: {sell_slippage} > {max_slippage}"
        ));
    }

    let net_edge_after_slippage = match (buy.average_fill_price, sell.average_fill_price) {
        (Some(buy_avg), Some(sell_avg)) if !buy_avg.is_zero() => {
            let gross = (sell_avg - buy_avg) / buy_avg;
            let net = gross - total_slippage;
            if net < target_edge {
                constraints.push(format!("net edge too low: {net} < {target_edge}"));
            }
            Some(net)
        }
        _ => None,
    };

    let feasible = constraints.is_empty()
        && max_size > Decimal::ZERO
        && total_slippage <= max_slippage * Decimal::TWO;

    FeasibilityAssessment {
        feasible,
        max_size,
        total_slippage,
        net_edge_after_slippage,
        constraints,
    }
}

fn fmt_opt(value: Option<Decimal>) -> String {
    value.map(|d| d.to_string()).unwrap_or_else(|| "none".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::analyzer::{build_depth, DepthConfig};
    use crate::depth::types::RawLevel;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn book(market_id: &str, bids: &[(Decimal, Decimal)], asks: &[(Decimal, Decimal)]) -> OrderbookDepth {
        let mut raw = Vec::new();
        for &(price, size) in bids {
            raw.push(RawLevel { price, side: Side::Buy, size });
        }
        for &(price, size) in asks {
            raw.push(RawLevel { price, side: Side::Sell, size });
        }
        let config = DepthConfig {
            min_level_size: Decimal::ZERO,
            ..DepthConfig::default()
        };
        build_depth(market_id, &raw, &config)
    }

    #[test]
    fn buy_walks_asks_and_averages_fill() {
        let depth = book(
            "mkt",
            &[(dec!(0.48), dec!(100))],
            &[(dec!(0.50), dec!(100)), (dec!(0.52), dec!(200))],
        );

        let est = calculate_slippage(&depth, Side::Buy, dec!(250));

        // 100 @ 0.50 + 150 @ 0.52 = 128 / 250 = 0.512
        assert_eq!(est.average_fill_price, Some(dec!(0.512)));
        assert_eq!(est.expected_fill_price, Some(dec!(0.50)));
        assert!(est.can_execute);
        assert!(!est.depth_exhausted);
        assert_eq!(est.max_executable_size, Some(dec!(250)));
        assert_eq!(
            est.levels_consumed,
            vec![(dec!(0.50), dec!(100)), (dec!(0.52), dec!(150))]
        );
        assert_eq!(est.slippage_absolute, Some(dec!(0.012)));
        assert_eq!(est.slippage_percentage, Some(dec!(0.024)));
    }

    #[test]
    fn sell_walks_bids() {
        let depth = book(
            "mkt",
            &[(dec!(0.48), dec!(50)), (dec!(0.47), dec!(50))],
            &[(dec!(0.52), dec!(100))],
        );

        let est = calculate_slippage(&depth, Side::Sell, dec!(75));

        // 50 @ 0.48 + 25 @ 0.47 = 35.75 / 75
        assert_eq!(est.expected_fill_price, Some(dec!(0.48)));
        assert!(est.can_execute);
        assert_eq!(est.levels_consumed.len(), 2);
        assert_eq!(est.liquidity_consumed, Some(dec!(0.75)));
    }

    #[test]
    fn oversized_trade_reports_depth_exhausted() {
        let depth = book("mkt", &[], &[(dec!(0.50), dec!(100)), (dec!(0.52), dec!(50))]);

        let est = calculate_slippage(&depth, Side::Buy, dec!(500));

        assert!(!est.can_execute);
        assert!(est.depth_exhausted);
        assert_eq!(est.max_executable_size, Some(dec!(150)));
    }

    #[test]
    fn max_executable_size_is_monotonic_in_requested_size() {
        let depth = book("mkt", &[], &[(dec!(0.50), dec!(100)), (dec!(0.52), dec!(50))]);

        let mut previous = Decimal::ZERO;
        for size in [dec!(50), dec!(100), dec!(120), dec!(150), dec!(500), dec!(1000)] {
            let est = calculate_slippage(&depth, Side::Buy, size);
            let max = est.max_executable_size.unwrap();
            assert!(max >= previous, "max_executable_size shrank at size {size}");
            previous = max;
        }
    }

    #[test]
    fn empty_book_yields_neutral_estimate() {
        let depth = OrderbookDepth::empty("mkt");
        let est = calculate_slippage(&depth, Side::Buy, dec!(100));

        assert!(!est.can_execute);
        assert!(!est.depth_exhausted);
        assert!(est.average_fill_price.is_none());
        assert!(est.max_executable_size.is_none());
    }

    #[test]
    fn price_impact_is_measured_from_mid() {
        let depth = book("mkt", &[(dec!(0.48), dec!(100))], &[(dec!(0.52), dec!(100))]);

        let est = calculate_slippage(&depth, Side::Buy, dec!(100));

        // Fill entirely at 0.52; mid is 0.50 -> impact 0.04, slippage 0
        assert_eq!(est.price_impact, Some(dec!(0.04)));
        assert_eq!(est.slippage_percentage, Some(dec!(0)));
    }

    #[test]
    fn arbitrage_legs_buy_on_cheaper_venue() {
        let cheap = book("cheap", &[(dec!(0.40), dec!(500))], &[(dec!(0.42), dec!(500))]);
        let dear = book("dear", &[(dec!(0.55), dec!(500))], &[(dec!(0.57), dec!(500))]);

        // Argument order must not matter
        let legs = calculate_arbitrage_slippage(&dear, &cheap, dec!(100)).unwrap();

        assert_eq!(legs.buy_venue, "cheap");
        assert_eq!(legs.sell_venue, "dear");
        assert_eq!(legs.buy_leg.side, Side::Buy);
        assert_eq!(legs.sell_leg.side, Side::Sell);
    }

    #[test]
    fn arbitrage_legs_require_both_mids() {
        let full = book("full", &[(dec!(0.48), dec!(100))], &[(dec!(0.52), dec!(100))]);
        let one_sided = book("half", &[(dec!(0.48), dec!(100))], &[]);

        assert!(calculate_arbitrage_slippage(&full, &one_sided, dec!(50)).is_none());
    }

    #[test]
    fn feasibility_passes_clean_arbitrage() {
        let cheap = book("cheap", &[(dec!(0.40), dec!(500))], &[(dec!(0.42), dec!(500))]);
        let dear = book("dear", &[(dec!(0.55), dec!(500))], &[(dec!(0.57), dec!(500))]);
        let legs = calculate_arbitrage_slippage(&cheap, &dear, dec!(100)).unwrap();

        let verdict = assess_arbitrage_feasibility(&legs, dec!(0.02), dec!(0.01));

        assert!(verdict.feasible, "constraints: {:?}", verdict.constraints);
        assert_eq!(verdict.max_size, dec!(100));
        assert!(verdict.constraints.is_empty());
        // Buy at 0.42, sell at 0.55, zero slippage at this size
        assert_eq!(verdict.total_slippage, dec!(0));
        assert!(verdict.net_edge_after_slippage.unwrap() > dec!(0.3));
    }

    #[test]
    fn feasibility_collects_every_violated_constraint() {
        // Thin books: both legs partial-fill and slip
        let cheap = book(
            "cheap",
            &[],
            &[(dec!(0.40), dec!(10)), (dec!(0.60), dec!(10))],
        );
        let dear = book(
            "dear",
            &[(dec!(0.62), dec!(10)), (dec!(0.41), dec!(10))],
            &[(dec!(0.70), dec!(10))],
        );
        let legs = ArbitrageLegs {
            buy_leg: calculate_slippage(&cheap, Side::Buy, dec!(100)),
            sell_leg: calculate_slippage(&dear, Side::Sell, dec!(100)),
            buy_venue: "cheap".to_string(),
            sell_venue: "dear".to_string(),
        };

        let verdict = assess_arbitrage_feasibility(&legs, dec!(0.5), dec!(0.001));

        assert!(!verdict.feasible);
        // Partial fills on both legs, slippage on both legs, edge too low
        assert!(verdict.constraints.len() >= 4);
        assert!(verdict
            .constraints
            .iter()
            .any(|c| c.contains("buy leg cannot execute")));
        assert!(verdict
            .constraints
            .iter()
            .any(|c| c.contains("net edge too low")));
    }

    #[test]
    fn feasibility_is_idempotent() {
        let cheap = book("cheap", &[(dec!(0.40), dec!(500))], &[(dec!(0.42), dec!(500))]);
        let dear = book("dear", &[(dec!(0.55), dec!(500))], &[(dec!(0.57), dec!(500))]);
        let legs = calculate_arbitrage_slippage(&cheap, &dear, dec!(100)).unwrap();

        let first = assess_arbitrage_feasibility(&legs, dec!(0.02), dec!(0.01));
        let second = assess_arbitrage_feasibility(&legs, dec!(0.02), dec!(0.01));

        assert_eq!(first.feasible, second.feasible);
        assert_eq!(first.max_size, second.max_size);
        assert_eq!(first.constraints, second.constraints);
        assert_eq!(first.net_edge_after_slippage, second.net_edge_after_slippage);
    }

    #[test]
    fn net_edge_decreases_as_leg_slippage_increases() {
        // Deeper second ask level forces more slippage at larger sizes
        let cheap = book(
            "cheap",
            &[(dec!(0.39), dec!(1000))],
            &[(dec!(0.42), dec!(100)), (dec!(0.50), dec!(1000))],
        );
        let dear = book("dear", &[(dec!(0.60), dec!(2000))], &[(dec!(0.62), dec!(2000))]);

        let small = calculate_arbitrage_slippage(&cheap, &dear, dec!(100)).unwrap();
        let large = calculate_arbitrage_slippage(&cheap, &dear, dec!(500)).unwrap();

        let v_small = assess_arbitrage_feasibility(&small, dec!(0.0), dec!(1.0));
        let v_large = assess_arbitrage_feasibility(&large, dec!(0.0), dec!(1.0));

        assert!(
            v_large.net_edge_after_slippage.unwrap() < v_small.net_edge_after_slippage.unwrap()
        );
    }
}
