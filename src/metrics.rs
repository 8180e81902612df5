//! Prometheus metrics for pipeline throughput and latency.
//!
//! This module provides metrics for:
//! - Event ingestion and venue fetch failures
//! - Pair evaluation and match throughput
//! - Opportunity detection and feasibility outcomes
//! - Cycle and depth-fetch latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Events ingested counter metric name.
pub const METRIC_EVENTS_INGESTED: &str = "events_ingested_total";
/// Venue fetch failures counter metric name.
pub const METRIC_VENUE_FETCH_FAILURES: &str = "venue_fetch_failures_total";
/// Pairs evaluated counter metric name.
pub const METRIC_PAIRS_EVALUATED: &str = "pairs_evaluated_total";
/// Matches found counter metric name.
pub const METRIC_MATCHES_FOUND: &str = "matches_found_total";
/// Strategy failures counter metric name.
pub const METRIC_STRATEGY_FAILURES: &str = "strategy_failures_total";
/// Matches queued for review counter metric name.
pub const METRIC_REVIEW_QUEUED: &str = "review_queued_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Feasibility checks counter metric name.
pub const METRIC_FEASIBILITY_CHECKS: &str = "feasibility_checks_total";
/// Feasible opportunities counter metric name.
pub const METRIC_FEASIBLE_OPPORTUNITIES: &str = "feasible_opportunities_total";
/// Scan cycle latency metric name.
pub const METRIC_CYCLE_LATENCY: &str = "scan_cycle_latency_ms";
/// Matching latency metric name.
pub const METRIC_MATCHING_LATENCY: &str = "matching_latency_ms";
/// Depth fetch latency metric name.
pub const METRIC_DEPTH_FETCH_LATENCY: &str = "depth_fetch_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(
        METRIC_EVENTS_INGESTED,
        "Total number of canonical events ingested"
    );
    describe_counter!(
        METRIC_VENUE_FETCH_FAILURES,
        "Total number of failed venue event fetches"
    );
    describe_counter!(
        METRIC_PAIRS_EVALUATED,
        "Total number of cross-venue event pairs evaluated"
    );
    describe_counter!(METRIC_MATCHES_FOUND, "Total number of accepted matches");
    describe_counter!(
        METRIC_STRATEGY_FAILURES,
        "Total number of scoring strategy failures"
    );
    describe_counter!(
        METRIC_REVIEW_QUEUED,
        "Total number of matches queued for human review"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of arbitrage opportunities detected"
    );
    describe_counter!(
        METRIC_FEASIBILITY_CHECKS,
        "Total number of depth-based feasibility assessments"
    );
    describe_counter!(
        METRIC_FEASIBLE_OPPORTUNITIES,
        "Total number of opportunities passing feasibility"
    );

    describe_histogram!(METRIC_CYCLE_LATENCY, "Full scan cycle latency in milliseconds");
    describe_histogram!(
        METRIC_MATCHING_LATENCY,
        "Cross-venue matching latency in milliseconds"
    );
    describe_histogram!(
        METRIC_DEPTH_FETCH_LATENCY,
        "Order book depth fetch latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Add to the events ingested counter.
pub fn add_events_ingested(count: u64) {
    counter!(METRIC_EVENTS_INGESTED).increment(count);
}

/// Increment the venue fetch failure counter.
pub fn inc_venue_fetch_failures() {
    counter!(METRIC_VENUE_FETCH_FAILURES).increment(1);
}

/// Increment the pairs evaluated counter.
pub fn inc_pairs_evaluated() {
    counter!(METRIC_PAIRS_EVALUATED).increment(1);
}

/// Increment the matches found counter.
pub fn inc_matches_found() {
    counter!(METRIC_MATCHES_FOUND).increment(1);
}

/// Increment the strategy failure counter.
pub fn inc_strategy_failures() {
    counter!(METRIC_STRATEGY_FAILURES).increment(1);
}

/// Increment the review queued counter.
pub fn inc_review_queued() {
    counter!(METRIC_REVIEW_QUEUED).increment(1);
}

/// Add to the opportunities detected counter.
pub fn add_opportunities_detected(count: u64) {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(count);
}

/// Increment the feasibility checks counter.
pub fn inc_feasibility_checks() {
    counter!(METRIC_FEASIBILITY_CHECKS).increment(1);
}

/// Increment the feasible opportunities counter.
pub fn inc_feasible_opportunities() {
    counter!(METRIC_FEASIBLE_OPPORTUNITIES).increment(1);
}

/// Record full-cycle latency.
pub fn record_cycle_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_CYCLE_LATENCY).record(latency_ms);
}

/// Record matching-stage latency.
pub fn record_matching_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_MATCHING_LATENCY).record(latency_ms);
}

/// Record a depth fetch latency for one market.
pub fn record_depth_fetch_latency(start: Instant, market_id: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_DEPTH_FETCH_LATENCY, "market_id" => market_id.to_string())
        .record(latency_ms);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a full scan cycle.
pub fn timer_cycle() -> LatencyTimer {
    LatencyTimer::new(METRIC_CYCLE_LATENCY)
}

/// Create a latency timer for the matching stage.
pub fn timer_matching() -> LatencyTimer {
    LatencyTimer::new(METRIC_MATCHING_LATENCY)
}
