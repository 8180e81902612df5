//! Cross-venue arbitrage scout entry point.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use arb_scout::api::{create_router, AppState};
use arb_scout::arbitrage::ArbitrageDetector;
use arb_scout::config::Config;
use arb_scout::depth::MarketDepthAnalyzer;
use arb_scout::event::Venue;
use arb_scout::matching::{default_strategies, EventMatcher, HumanReviewQueue};
use arb_scout::metrics;
use arb_scout::scout::{AssessedOpportunity, CycleReport, Scout, ScoutSchedule};
use arb_scout::sources::{EventSource, FileDepthSource, FileEventSource};

/// Cross-venue prediction market arbitrage scout.
#[derive(Parser, Debug)]
#[command(name = "arb-scout")]
#[command(about = "Detects cross-venue prediction market arbitrage opportunities")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the continuous scan loop with the HTTP status server (default).
    Run {
        /// HTTP server port for health/metrics.
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Run a single scan cycle and print the ranked opportunities.
    Scan,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("arb_scout=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::Scan) => cmd_scan().await,
        Some(Command::Run { port }) => cmd_run(port).await,
        None => cmd_run(8080).await,
    }
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ARB SCOUT - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Match Confidence Threshold: {}", config.confidence_threshold);
    println!("  Review Floor: {}", config.review_confidence_floor);
    println!("  Min Edge Threshold: {}", config.min_edge_threshold);
    println!("  Max Slippage Tolerance: {}", config.max_slippage_tolerance);
    println!(
        "  Polymarket Fees: {}% + ${}",
        config.polymarket_trading_fee * rust_decimal::Decimal::ONE_HUNDRED,
        config.polymarket_fixed_cost
    );
    println!(
        "  Predyx Fees: {}% + ${}",
        config.predyx_trading_fee * rust_decimal::Decimal::ONE_HUNDRED,
        config.predyx_fixed_cost
    );
    println!("  Poll Interval: {}s (cap {}s)", config.poll_interval_secs, config.max_poll_interval_secs);
    println!(
        "  Events Snapshot: {}",
        config.events_snapshot.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  Depth Snapshot: {}",
        config.depth_snapshot.as_deref().unwrap_or("(not set)")
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Build the scout from configuration and snapshot-backed sources.
fn build_scout(config: &Config) -> anyhow::Result<Scout> {
    let events_path = config
        .events_snapshot
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("EVENTS_SNAPSHOT must point to an events JSON file"))?;
    let depth_path = config
        .depth_snapshot
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DEPTH_SNAPSHOT must point to a depth JSON file"))?;

    let event_sources: Vec<Arc<dyn EventSource>> = vec![
        Arc::new(FileEventSource::new(Venue::Polymarket, events_path)),
        Arc::new(FileEventSource::new(Venue::Predyx, events_path)),
        Arc::new(FileEventSource::new(Venue::StackerNews, events_path)),
    ];

    // No semantic scorer on the CLI path; library users inject one.
    let matcher = EventMatcher::new(default_strategies(None), config.matcher_config())?;
    let detector = ArbitrageDetector::new(config.detector_config())?;
    let analyzer = MarketDepthAnalyzer::new(
        Arc::new(FileDepthSource::new(depth_path)),
        config.depth_config(),
    );

    Ok(Scout::new(
        matcher,
        detector,
        analyzer,
        HumanReviewQueue::new(),
        event_sources,
        ScoutSchedule {
            poll_interval_secs: config.poll_interval_secs,
            max_poll_interval_secs: config.max_poll_interval_secs,
            max_consecutive_errors: config.max_consecutive_errors,
            event_fetch_timeout_secs: config.event_fetch_timeout_secs,
        },
    ))
}

/// Run a single scan cycle and print the results.
async fn cmd_scan() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let scout = build_scout(&config)?;

    println!("Running scan cycle...\n");
    let report = scout.run_cycle().await?;

    println!("======================================================================");
    println!("SCAN CYCLE COMPLETE");
    println!("======================================================================");
    println!("  Events ingested: {}", report.summary.events_ingested);
    println!("  Venues failed: {}", report.summary.venues_failed);
    println!("  Matches found: {}", report.summary.matches_found);
    println!("  Queued for review: {}", report.summary.review_queued);
    println!("  Opportunities: {}", report.summary.opportunities);
    println!("  Feasible after depth: {}", report.summary.feasible);
    println!("----------------------------------------------------------------------");

    if report.opportunities.is_empty() {
        println!("No opportunities this cycle.");
    }
    for (rank, assessed) in report.opportunities.iter().enumerate() {
        print_opportunity(rank + 1, assessed);
    }
    println!("======================================================================");

    Ok(())
}

fn print_opportunity(rank: usize, assessed: &AssessedOpportunity) {
    let opp = &assessed.opportunity;
    println!(
        "#{} [{}] {} {} @ {} + {} {} @ {}",
        rank,
        opp.arbitrage_type,
        opp.leg_a.venue,
        opp.leg_a.side,
        opp.leg_a.price,
        opp.leg_b.venue,
        opp.leg_b.side,
        opp.leg_b.price,
    );
    println!(
        "    gross edge: {}  net edge: {}  size cap: {}  expected profit: ${}",
        opp.gross_edge, opp.net_edge, opp.max_position_size, opp.expected_profit
    );
    println!(
        "    confidence: {:.2}  timing risk: {:.2}  resolution risk: {:.2}",
        opp.confidence_score, opp.timing_risk_score, opp.resolution_risk_score
    );
    match &assessed.feasibility {
        Some(verdict) if verdict.feasible => {
            println!(
                "    FEASIBLE at size {} (net edge after slippage: {})",
                verdict.max_size,
                verdict
                    .net_edge_after_slippage
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "n/a".to_string())
            );
        }
        Some(verdict) => {
            println!("    NOT FEASIBLE:");
            for constraint in &verdict.constraints {
                println!("      - {}", constraint);
            }
        }
        None => {
            println!("    (no depth data; heuristic estimate only)");
        }
    }
}

/// Run the continuous scan loop with the HTTP status server.
async fn cmd_run(port: u16) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Min edge threshold: {}", config.min_edge_threshold);
    info!("Max slippage tolerance: {}", config.max_slippage_tolerance);
    info!("Poll interval: {}s", config.poll_interval_secs);

    // Install the Prometheus exporter and share its handle with the API
    let prometheus = PrometheusBuilder::new().install_recorder()?;
    let app_state = AppState::with_prometheus(prometheus);

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    let _server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    let scout = build_scout(&config)?;

    // Cooperative stop flag, raised on Ctrl-C and checked between cycles
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("shutdown requested, stopping after current cycle");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    info!("Starting arbitrage scout...");

    let on_cycle = {
        let app_state = app_state.clone();
        move |report: &CycleReport| {
            for assessed in &report.opportunities {
                if assessed.feasibility.as_ref().is_some_and(|f| f.feasible) {
                    info!(
                        net_edge = %assessed.opportunity.net_edge,
                        venue_a = %assessed.opportunity.leg_a.venue,
                        venue_b = %assessed.opportunity.leg_b.venue,
                        "feasible opportunity"
                    );
                }
            }

            let state = app_state.clone();
            let summary = report.summary.clone();
            tokio::spawn(async move {
                state.record_cycle(summary).await;
            });
        }
    };

    scout.run_continuous(stop, on_cycle).await;

    info!("Scout stopped");
    Ok(())
}

/// Resolve when a shutdown signal is received.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
