//! Handlers for the `/scans` resource.
//!
//! Provides single-dataset scans (JSON or CSV upload), batch scans over
//! several named datasets, and CSV report export. Every successful scan
//! records its score in the process trend under the server's current date,
//! whatever `as_of` the request pinned.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use compliance_core::dataset::{
    normalize, NormalizedDataset, ParseWarning, SchemaKind, CANONICAL_COLUMNS,
};
use compliance_core::export::export_csv;
use compliance_core::scan::{run_batch_scan, run_scan, BatchScan, NamedDataset, ViolationSet};
use compliance_core::table::RawTable;
use compliance_core::threshold::{RiskSensitivity, ThresholdConfig, ThresholdSettings};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::request::{evaluation_date, DatasetPayload, ThresholdOverrides};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::upload::parse_csv;

/// `Content-Disposition` offered for CSV report downloads.
pub const REPORT_DISPOSITION: &str = "attachment; filename=\"compliance_report.csv\"";

// ── Request / response types ─────────────────────────────────────────

/// Request body for a single-dataset scan or export.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(flatten)]
    pub dataset: DatasetPayload,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
    pub as_of: Option<NaiveDate>,
}

/// Query parameters accompanying a CSV upload.
#[derive(Debug, Default, Deserialize)]
pub struct ScanCsvParams {
    pub password_age_limit_days: Option<i64>,
    pub patch_age_limit_days: Option<i64>,
    pub mfa_mandatory: Option<bool>,
    pub risk_sensitivity: Option<RiskSensitivity>,
    pub as_of: Option<NaiveDate>,
}

impl ScanCsvParams {
    fn overrides(&self) -> ThresholdOverrides {
        ThresholdOverrides {
            password_age_limit_days: self.password_age_limit_days,
            patch_age_limit_days: self.patch_age_limit_days,
            mfa_mandatory: self.mfa_mandatory,
            risk_sensitivity: self.risk_sensitivity,
        }
    }
}

/// One named dataset inside a batch request.
#[derive(Debug, Deserialize)]
pub struct NamedDatasetPayload {
    pub name: String,
    #[serde(flatten)]
    pub dataset: DatasetPayload,
}

/// Request body for a batch scan.
#[derive(Debug, Deserialize)]
pub struct BatchScanRequest {
    pub datasets: Vec<NamedDatasetPayload>,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
    pub as_of: Option<NaiveDate>,
}

/// Result of one scan, with the context it ran under.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub scan_id: Uuid,
    pub as_of: NaiveDate,
    pub thresholds: ThresholdSettings,
    pub schema: SchemaKind,
    pub warnings: Vec<ParseWarning>,
    pub result: ViolationSet,
}

/// Result of a batch scan.
#[derive(Debug, Serialize)]
pub struct BatchScanResponse {
    pub scan_id: Uuid,
    pub as_of: NaiveDate,
    pub thresholds: ThresholdSettings,
    pub result: BatchScan,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// POST /api/v1/scans
///
/// Normalize the supplied dataset and scan it against the resolved
/// thresholds.
pub async fn scan(
    State(state): State<AppState>,
    Json(body): Json<ScanRequest>,
) -> AppResult<Json<DataResponse<ScanResponse>>> {
    let config = body.thresholds.resolve(&state.config.default_thresholds)?;
    let response = scan_table(&state, body.dataset.into_table(), config, body.as_of).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/scans/csv
///
/// Scan a raw CSV upload. Thresholds and the evaluation date come from the
/// query string.
pub async fn scan_csv(
    State(state): State<AppState>,
    Query(params): Query<ScanCsvParams>,
    body: String,
) -> AppResult<Json<DataResponse<ScanResponse>>> {
    let config = params
        .overrides()
        .resolve(&state.config.default_thresholds)?;
    let table = parse_csv(&body)?;
    let response = scan_table(&state, table, config, params.as_of).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/scans/batch
///
/// Scan several named datasets in one run. Every dataset is normalized
/// before any is scanned, so a schema problem in one rejects the batch.
pub async fn scan_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchScanRequest>,
) -> AppResult<Json<DataResponse<BatchScanResponse>>> {
    if body.datasets.is_empty() {
        return Err(AppError::BadRequest(
            "datasets array must not be empty".to_string(),
        ));
    }
    let config = body.thresholds.resolve(&state.config.default_thresholds)?;
    let as_of = evaluation_date(body.as_of);

    let named = body
        .datasets
        .into_iter()
        .map(|payload| {
            let dataset = prepare_dataset(payload.dataset.into_table())?;
            Ok(NamedDataset {
                name: payload.name,
                dataset,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let result = run_batch_scan(&named, &config, as_of);
    state
        .trend
        .record_today(result.combined.compliance_score)
        .await;

    tracing::info!(
        datasets = named.len(),
        records = result.combined.total_records,
        violations = result.combined.total_violations,
        score = result.combined.compliance_score,
        "Batch scan complete"
    );

    Ok(Json(DataResponse {
        data: BatchScanResponse {
            scan_id: Uuid::now_v7(),
            as_of,
            thresholds: config.settings(),
            result,
        },
    }))
}

/// POST /api/v1/scans/export
///
/// Scan the supplied dataset and return the violation list as a CSV
/// download. Does not touch the trend.
pub async fn export_report(
    State(state): State<AppState>,
    Json(body): Json<ScanRequest>,
) -> AppResult<(
    StatusCode,
    [(header::HeaderName, &'static str); 2],
    String,
)> {
    let config = body.thresholds.resolve(&state.config.default_thresholds)?;
    let dataset = prepare_dataset(body.dataset.into_table())?;
    let result = run_scan(&dataset, &config, evaluation_date(body.as_of));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, REPORT_DISPOSITION),
        ],
        export_csv(&result.violations),
    ))
}

// ── Private helpers ──────────────────────────────────────────────────

/// Normalize an uploaded table, rejecting empty uploads.
pub(crate) fn prepare_dataset(table: RawTable) -> AppResult<NormalizedDataset> {
    if table.is_empty() {
        return Err(AppError::BadRequest(
            "dataset must contain at least one row".to_string(),
        ));
    }
    let dataset = normalize(&table, CANONICAL_COLUMNS)?;
    if !dataset.warnings.is_empty() {
        tracing::warn!(
            warnings = dataset.warnings.len(),
            "Dataset contained unparseable cells"
        );
    }
    Ok(dataset)
}

async fn scan_table(
    state: &AppState,
    table: RawTable,
    config: ThresholdConfig,
    as_of: Option<NaiveDate>,
) -> AppResult<ScanResponse> {
    let as_of = evaluation_date(as_of);
    let dataset = prepare_dataset(table)?;
    let result = run_scan(&dataset, &config, as_of);

    state.trend.record_today(result.compliance_score()).await;

    tracing::info!(
        schema = ?dataset.schema,
        records = result.total_records,
        violations = result.violations.len(),
        score = result.compliance_score(),
        "Scan complete"
    );

    Ok(ScanResponse {
        scan_id: Uuid::now_v7(),
        as_of,
        thresholds: config.settings(),
        schema: dataset.schema,
        warnings: dataset.warnings,
        result,
    })
}
