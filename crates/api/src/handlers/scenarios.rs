//! Handlers for the `/scenarios` and `/simulations` resources.

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use compliance_core::scenario::{simulate, RemediationAction, ScenarioOutcome};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::scans::prepare_dataset;
use crate::request::{evaluation_date, DatasetPayload, ThresholdOverrides};
use crate::response::DataResponse;
use crate::state::AppState;

/// One entry of the scenario picker.
#[derive(Debug, Serialize)]
pub struct ScenarioOption {
    pub action: RemediationAction,
    pub label: &'static str,
}

/// Request body for a simulation.
#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    #[serde(flatten)]
    pub dataset: DatasetPayload,
    pub action: RemediationAction,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
    pub as_of: Option<NaiveDate>,
}

/// GET /api/v1/scenarios
///
/// List the available remediation actions.
pub async fn list_scenarios() -> Json<DataResponse<Vec<ScenarioOption>>> {
    let options = RemediationAction::ALL
        .into_iter()
        .map(|action| ScenarioOption {
            action,
            label: action.label(),
        })
        .collect();
    Json(DataResponse { data: options })
}

/// POST /api/v1/simulations
///
/// Project the compliance score after applying `action` to every record.
/// The uploaded data and the trend are left untouched.
pub async fn run_simulation(
    State(state): State<AppState>,
    Json(body): Json<SimulationRequest>,
) -> AppResult<Json<DataResponse<ScenarioOutcome>>> {
    let config = body.thresholds.resolve(&state.config.default_thresholds)?;
    let dataset = prepare_dataset(body.dataset.into_table())?;
    let outcome = simulate(&dataset, &config, body.action, evaluation_date(body.as_of));

    tracing::info!(
        action = %outcome.action,
        current = outcome.current_score,
        projected = outcome.projected_score,
        "Simulation complete"
    );

    Ok(Json(DataResponse { data: outcome }))
}
