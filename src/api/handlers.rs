//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::scout::CycleSummary;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether the scout has completed at least one cycle.
    pub ready: Arc<AtomicBool>,
    /// Summary of the most recent cycle.
    pub last_cycle: Arc<tokio::sync::RwLock<Option<CycleSummary>>>,
    /// Prometheus render handle, when the exporter is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state without a metrics exporter.
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            last_cycle: Arc::new(tokio::sync::RwLock::new(None)),
            prometheus: None,
        }
    }

    /// Create app state with a Prometheus render handle.
    pub fn with_prometheus(handle: PrometheusHandle) -> Self {
        Self {
            prometheus: Some(handle),
            ..Self::new()
        }
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Record the latest cycle summary.
    pub async fn record_cycle(&self, summary: CycleSummary) {
        *self.last_cycle.write().await = Some(summary);
        self.set_ready(true);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether at least one cycle has completed.
    pub ready: bool,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Most recent cycle, if any.
    pub last_cycle: Option<CycleResponse>,
}

/// Cycle summary in the status response.
#[derive(Debug, Serialize)]
pub struct CycleResponse {
    /// Events ingested.
    pub events_ingested: usize,
    /// Venues that failed to fetch.
    pub venues_failed: usize,
    /// Matches accepted.
    pub matches_found: usize,
    /// Matches queued for review.
    pub review_queued: usize,
    /// Opportunities detected.
    pub opportunities: usize,
    /// Opportunities passing feasibility.
    pub feasible: usize,
    /// Completion time (RFC 3339).
    pub completed_at: String,
}

impl From<&CycleSummary> for CycleResponse {
    fn from(summary: &CycleSummary) -> Self {
        Self {
            events_ingested: summary.events_ingested,
            venues_failed: summary.venues_failed,
            matches_found: summary.matches_found,
            review_queued: summary.review_queued,
            opportunities: summary.opportunities,
            feasible: summary.feasible,
            completed_at: summary
                .completed_at
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
        }
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse { ready: is_ready };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns scout status and last-cycle statistics.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let last_cycle = state.last_cycle.read().await;

    Json(StatusResponse {
        status: if state.is_ready() { "running" } else { "starting" },
        last_cycle: last_cycle.as_ref().map(CycleResponse::from),
    })
}

/// Prometheus metrics handler.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics exporter not installed".to_string(),
        ),
    }
}
