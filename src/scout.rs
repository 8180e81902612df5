//! Thin orchestrator: ingest, match, detect, assess, repeat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::join_all;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::arbitrage::{ArbitrageDetector, ArbitrageOpportunity};
use crate::depth::{
    assess_arbitrage_feasibility, calculate_arbitrage_slippage, ArbitrageLegs,
    FeasibilityAssessment, MarketDepthAnalyzer, OrderbookDepth,
};
use crate::error::{Result, ScoutError, SourceError};
use crate::event::Event;
use crate::matching::{EventMatcher, HumanReviewQueue, MatchResult};
use crate::metrics;
use crate::sources::EventSource;

/// An opportunity with its depth-based feasibility verdict attached.
///
/// When live depth was available for both legs, the feasibility numbers
/// supersede the opportunity's heuristic slippage and sizing; otherwise
/// the heuristic figures stand and `feasibility` is absent.
#[derive(Debug, Clone)]
pub struct AssessedOpportunity {
    /// The detected opportunity with heuristic economics.
    pub opportunity: ArbitrageOpportunity,
    /// Two-leg slippage simulation, when depth was available.
    pub legs: Option<ArbitrageLegs>,
    /// Feasibility verdict, when depth was available.
    pub feasibility: Option<FeasibilityAssessment>,
}

/// Aggregate numbers for one completed scan cycle.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    /// Events ingested across all venues.
    pub events_ingested: usize,
    /// Venues whose fetch failed this cycle.
    pub venues_failed: usize,
    /// Accepted matches.
    pub matches_found: usize,
    /// Matches queued for human review.
    pub review_queued: usize,
    /// Opportunities detected.
    pub opportunities: usize,
    /// Opportunities passing depth-based feasibility.
    pub feasible: usize,
    /// When the cycle finished.
    pub completed_at: OffsetDateTime,
}

/// Result of one scan cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Ranked assessed opportunities (net edge descending).
    pub opportunities: Vec<AssessedOpportunity>,
    /// Aggregate cycle numbers.
    pub summary: CycleSummary,
}

/// Scheduling parameters for the continuous loop.
#[derive(Debug, Clone)]
pub struct ScoutSchedule {
    /// Base seconds between cycles.
    pub poll_interval_secs: u64,
    /// Backoff cap on the interval.
    pub max_poll_interval_secs: u64,
    /// Consecutive errors before the interval doubles.
    pub max_consecutive_errors: u32,
    /// Deadline for a single venue's event fetch.
    pub event_fetch_timeout_secs: u64,
}

impl Default for ScoutSchedule {
    fn default() -> Self {
        Self {
            poll_interval_secs: 120,
            max_poll_interval_secs: 600,
            max_consecutive_errors: 3,
            event_fetch_timeout_secs: 30,
        }
    }
}

/// Orchestrates the ingest -> match -> detect -> assess pipeline.
pub struct Scout {
    matcher: Arc<EventMatcher>,
    detector: ArbitrageDetector,
    analyzer: MarketDepthAnalyzer,
    review_queue: HumanReviewQueue,
    event_sources: Vec<Arc<dyn EventSource>>,
    schedule: ScoutSchedule,
    /// Latest depth snapshot per market, replaced wholesale per fetch.
    depth_snapshots: DashMap<String, Arc<OrderbookDepth>>,
}

impl Scout {
    /// Assemble a scout from its pipeline stages and sources.
    pub fn new(
        matcher: EventMatcher,
        detector: ArbitrageDetector,
        analyzer: MarketDepthAnalyzer,
        review_queue: HumanReviewQueue,
        event_sources: Vec<Arc<dyn EventSource>>,
        schedule: ScoutSchedule,
    ) -> Self {
        Self {
            matcher: Arc::new(matcher),
            detector,
            analyzer,
            review_queue,
            event_sources,
            schedule,
            depth_snapshots: DashMap::new(),
        }
    }

    /// The shared review queue.
    pub fn review_queue(&self) -> &HumanReviewQueue {
        &self.review_queue
    }

    /// Latest depth snapshot for a market, if one was fetched.
    pub fn depth_snapshot(&self, market_id: &str) -> Option<Arc<OrderbookDepth>> {
        self.depth_snapshots.get(market_id).map(|e| e.value().clone())
    }

    /// Run one complete discovery and analysis cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let cycle_start = Instant::now();

        // 1. Fetch every venue's events concurrently; one venue's
        // failure skips that venue only.
        let (events_by_venue, venues_failed) = self.fetch_all_events().await?;
        let events_ingested: usize = events_by_venue.iter().map(|v| v.len()).sum();
        metrics::add_events_ingested(events_ingested as u64);

        // 2. Match every venue pair; pair evaluations are pure, so they
        // fan out across blocking workers and merge here.
        let matches = self.match_venue_pairs(&events_by_venue).await;

        // 3. Queue anything requiring human review.
        let mut review_queued = 0usize;
        for m in &matches {
            if m.human_review_required {
                self.review_queue.enqueue(m.clone());
                metrics::inc_review_queued();
                review_queued += 1;
            }
        }

        // 4. Economic screen.
        let opportunities = self.detector.scan_for_arbitrage(&matches);

        // 5. Depth-based feasibility for each candidate.
        let mut assessed = Vec::with_capacity(opportunities.len());
        let mut feasible = 0usize;
        for opportunity in opportunities {
            let result = self.assess_opportunity(opportunity).await;
            if result
                .feasibility
                .as_ref()
                .is_some_and(|f| f.feasible)
            {
                feasible += 1;
            }
            assessed.push(result);
        }

        metrics::record_cycle_latency(cycle_start);

        let summary = CycleSummary {
            events_ingested,
            venues_failed,
            matches_found: matches.len(),
            review_queued,
            opportunities: assessed.len(),
            feasible,
            completed_at: OffsetDateTime::now_utc(),
        };

        info!(
            events = summary.events_ingested,
            matches = summary.matches_found,
            opportunities = summary.opportunities,
            feasible = summary.feasible,
            "cycle completed"
        );

        Ok(CycleReport {
            opportunities: assessed,
            summary,
        })
    }

    /// Run cycles until the stop flag is raised, backing off after
    /// repeated failures.
    ///
    /// The flag is checked between cycles, never mid-computation.
    pub async fn run_continuous(
        &self,
        stop: Arc<AtomicBool>,
        mut on_cycle: impl FnMut(&CycleReport),
    ) {
        let base_interval = self.schedule.poll_interval_secs;
        let mut interval = base_interval;
        let mut consecutive_errors = 0u32;

        info!(interval_secs = interval, "starting continuous scan");

        while !stop.load(Ordering::SeqCst) {
            match self.run_cycle().await {
                Ok(report) => {
                    consecutive_errors = 0;
                    interval = base_interval;
                    on_cycle(&report);
                }
                Err(e) => {
                    consecutive_errors += 1;
                    error!(
                        error = %e,
                        attempt = consecutive_errors,
                        "scan cycle failed"
                    );
                    if consecutive_errors >= self.schedule.max_consecutive_errors {
                        interval = (interval * 2).min(self.schedule.max_poll_interval_secs);
                        warn!(
                            interval_secs = interval,
                            "too many consecutive errors, backing off"
                        );
                    }
                }
            }

            if stop.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }

        info!("continuous scan stopped");
    }

    /// Fetch events from every source concurrently.
    ///
    /// Errors when *every* venue failed; a partial failure only logs.
    async fn fetch_all_events(&self) -> Result<(Vec<Vec<Event>>, usize)> {
        let timeout = Duration::from_secs(self.schedule.event_fetch_timeout_secs);
        let fetches = self.event_sources.iter().map(|source| {
            let source = source.clone();
            async move {
                let result = tokio::time::timeout(timeout, source.list_events())
                    .await
                    .unwrap_or(Err(SourceError::Timeout {
                        timeout_secs: timeout.as_secs(),
                    }));
                (source.venue(), result)
            }
        });

        let mut events_by_venue = Vec::new();
        let mut venues_failed = 0usize;
        let mut last_error = None;

        for (venue, result) in join_all(fetches).await {
            match result {
                Ok(events) => {
                    info!(venue = %venue, count = events.len(), "fetched events");
                    events_by_venue.push(events);
                }
                Err(e) => {
                    metrics::inc_venue_fetch_failures();
                    warn!(venue = %venue, error = %e, "venue fetch failed, skipping");
                    venues_failed += 1;
                    last_error = Some(e);
                }
            }
        }

        if events_by_venue.is_empty() {
            let error = last_error.unwrap_or(SourceError::Parse("no sources configured".into()));
            return Err(ScoutError::Source(error));
        }

        Ok((events_by_venue, venues_failed))
    }

    /// Match every cross-venue pair of event lists.
    async fn match_venue_pairs(&self, events_by_venue: &[Vec<Event>]) -> Vec<MatchResult> {
        let match_start = Instant::now();
        let mut tasks = Vec::new();

        for i in 0..events_by_venue.len() {
            for j in (i + 1)..events_by_venue.len() {
                let matcher = self.matcher.clone();
                let events_a = events_by_venue[i].clone();
                let events_b = events_by_venue[j].clone();
                tasks.push(tokio::task::spawn_blocking(move || {
                    matcher.find_matches(&events_a, &events_b)
                }));
            }
        }

        let mut matches = Vec::new();
        for task in join_all(tasks).await {
            match task {
                Ok(pair_matches) => matches.extend(pair_matches),
                Err(e) => error!(error = %e, "matching task panicked"),
            }
        }

        metrics::record_matching_latency(match_start);
        matches
    }

    /// Attach a depth-based feasibility verdict where depth is available.
    async fn assess_opportunity(&self, opportunity: ArbitrageOpportunity) -> AssessedOpportunity {
        let market_a = opportunity.match_result.event_a.source_id();
        let market_b = opportunity.match_result.event_b.source_id();

        let (market_a, market_b) = match (market_a, market_b) {
            (Some(a), Some(b)) => (a.to_string(), b.to_string()),
            _ => {
                warn!("missing market ids, skipping depth assessment");
                return AssessedOpportunity {
                    opportunity,
                    legs: None,
                    feasibility: None,
                };
            }
        };

        // Fresh snapshot per venue, per check. The two snapshots are not
        // synchronized with each other; that residual execution risk is
        // accepted, not locked away.
        let fetch_start = Instant::now();
        let (depth_a, depth_b) = tokio::join!(
            self.analyzer.get_market_depth(&market_a),
            self.analyzer.get_market_depth(&market_b),
        );
        metrics::record_depth_fetch_latency(fetch_start, &market_a);

        let (depth_a, depth_b) = match (depth_a, depth_b) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                // A failed fetch is not zero liquidity; the heuristic
                // numbers stand and no verdict is attached.
                warn!(error = %e, "depth fetch failed, keeping heuristic estimate");
                return AssessedOpportunity {
                    opportunity,
                    legs: None,
                    feasibility: None,
                };
            }
        };

        self.depth_snapshots
            .insert(market_a.clone(), Arc::new(depth_a.clone()));
        self.depth_snapshots
            .insert(market_b.clone(), Arc::new(depth_b.clone()));

        let legs =
            calculate_arbitrage_slippage(&depth_a, &depth_b, opportunity.max_position_size);

        let feasibility = legs.as_ref().map(|legs| {
            metrics::inc_feasibility_checks();
            let verdict = assess_arbitrage_feasibility(
                legs,
                self.detector.config().min_edge_threshold,
                self.detector.config().max_slippage_tolerance,
            );
            if verdict.feasible {
                metrics::inc_feasible_opportunities();
            }
            verdict
        });

        AssessedOpportunity {
            opportunity,
            legs,
            feasibility,
        }
    }
}
