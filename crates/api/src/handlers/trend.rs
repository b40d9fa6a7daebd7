//! Handler for the `/trend` resource.

use axum::extract::State;
use axum::Json;
use compliance_core::trend::TrendPoint;
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

/// Score history plus the most recent movement.
#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub points: Vec<TrendPoint>,
    pub latest: Option<TrendPoint>,
    /// Change between the two most recent days; `null` until two exist.
    pub latest_change: Option<f64>,
}

/// GET /api/v1/trend
///
/// Return the compliance score history recorded by scans in this process.
pub async fn get_trend(State(state): State<AppState>) -> Json<DataResponse<TrendResponse>> {
    let trend = state.trend.snapshot().await;
    let latest = trend.latest().copied();
    let latest_change = trend.latest_change();

    Json(DataResponse {
        data: TrendResponse {
            points: trend.points,
            latest,
            latest_change,
        },
    })
}
