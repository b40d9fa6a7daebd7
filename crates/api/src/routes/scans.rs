//! Route definitions for the `/scans`, `/scenarios`, `/simulations` and
//! `/trend` resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{scans, scenarios, trend};
use crate::state::AppState;

/// Routes mounted at `/scans`.
///
/// ```text
/// POST   /          -> scan            (JSON dataset)
/// POST   /csv       -> scan_csv        (text/csv body, query thresholds)
/// POST   /batch     -> scan_batch
/// POST   /export    -> export_report   (CSV)
/// ```
pub fn scans_router() -> Router<AppState> {
    Router::new()
        .route("/", post(scans::scan))
        .route("/csv", post(scans::scan_csv))
        .route("/batch", post(scans::scan_batch))
        .route("/export", post(scans::export_report))
}

/// Scenario listing, simulation and trend routes.
///
/// ```text
/// GET    /scenarios     -> list_scenarios
/// POST   /simulations   -> run_simulation
/// GET    /trend         -> get_trend
/// ```
pub fn analysis_router() -> Router<AppState> {
    Router::new()
        .route("/scenarios", get(scenarios::list_scenarios))
        .route("/simulations", post(scenarios::run_simulation))
        .route("/trend", get(trend::get_trend))
}
