pub mod health;
pub mod scans;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /scans                  scan a JSON dataset (POST)
/// /scans/csv              scan a CSV upload (POST)
/// /scans/batch            scan several named datasets (POST)
/// /scans/export           scan and download the CSV report (POST)
///
/// /scenarios              list remediation actions (GET)
/// /simulations            project a remediation action (POST)
/// /trend                  compliance score history (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/scans", scans::scans_router())
        .merge(scans::analysis_router())
}
