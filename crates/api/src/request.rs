//! Shared request body types for the scan and simulation handlers.

use chrono::NaiveDate;
use compliance_core::error::CoreError;
use compliance_core::table::{RawRow, RawTable};
use compliance_core::threshold::{RiskSensitivity, ThresholdConfig, ThresholdSettings};
use serde::Deserialize;
use serde_json::Value;

/// A dataset supplied inline, either as keyed records or as a header plus
/// positional rows.
#[derive(Debug, Default, Deserialize)]
pub struct DatasetPayload {
    #[serde(default)]
    pub records: Vec<RawRow>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl DatasetPayload {
    /// Convert to a raw table. A non-empty `columns` list selects the
    /// positional form.
    pub fn into_table(self) -> RawTable {
        if self.columns.is_empty() {
            RawTable::from_records(self.records)
        } else {
            RawTable::from_rows(self.columns, self.rows)
        }
    }
}

/// Per-request threshold overrides. Unset fields fall back to the server
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThresholdOverrides {
    pub password_age_limit_days: Option<i64>,
    pub patch_age_limit_days: Option<i64>,
    pub mfa_mandatory: Option<bool>,
    pub risk_sensitivity: Option<RiskSensitivity>,
}

impl ThresholdOverrides {
    /// Merge onto `defaults` and validate the result.
    pub fn resolve(&self, defaults: &ThresholdConfig) -> Result<ThresholdConfig, CoreError> {
        let base = defaults.settings();
        ThresholdConfig::try_from(ThresholdSettings {
            password_age_limit_days: self
                .password_age_limit_days
                .unwrap_or(base.password_age_limit_days),
            patch_age_limit_days: self
                .patch_age_limit_days
                .unwrap_or(base.patch_age_limit_days),
            mfa_mandatory: self.mfa_mandatory.unwrap_or(base.mfa_mandatory),
            risk_sensitivity: self.risk_sensitivity.unwrap_or(base.risk_sensitivity),
        })
    }
}

/// Evaluation date from the request, or today's UTC date.
pub fn evaluation_date(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| chrono::Utc::now().date_naive())
}
