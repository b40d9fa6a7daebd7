//! What-if remediation scenarios.
//!
//! A scenario forces selected fields of every record to their compliant
//! values on a copy of the dataset, rescans the copy, and reports how the
//! compliance score would move.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::{Freshness, NormalizedDataset, Record};
use crate::scan::{run_scan, ViolationSet};
use crate::threshold::ThresholdConfig;

/// A bulk remediation to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemediationAction {
    EnforceMfa,
    ResetAllPasswords,
    PatchAllDevices,
    FullRemediation,
}

impl RemediationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnforceMfa => "EnforceMfa",
            Self::ResetAllPasswords => "ResetAllPasswords",
            Self::PatchAllDevices => "PatchAllDevices",
            Self::FullRemediation => "FullRemediation",
        }
    }

    /// Human-readable label for scenario pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EnforceMfa => "Enable MFA for all users",
            Self::ResetAllPasswords => "Reset all passwords",
            Self::PatchAllDevices => "Full patch deployment",
            Self::FullRemediation => "Full remediation",
        }
    }

    pub const ALL: [RemediationAction; 4] = [
        Self::EnforceMfa,
        Self::ResetAllPasswords,
        Self::PatchAllDevices,
        Self::FullRemediation,
    ];

    fn enforces_mfa(&self) -> bool {
        matches!(self, Self::EnforceMfa | Self::FullRemediation)
    }

    fn resets_passwords(&self) -> bool {
        matches!(self, Self::ResetAllPasswords | Self::FullRemediation)
    }

    fn patches_devices(&self) -> bool {
        matches!(self, Self::PatchAllDevices | Self::FullRemediation)
    }

    /// Return a remediated copy of `record`.
    pub fn apply(&self, record: &Record, today: NaiveDate) -> Record {
        let mut remediated = record.clone();
        if self.enforces_mfa() {
            remediated.mfa_enabled = true;
        }
        if self.resets_passwords() {
            remediated.last_password_change = Freshness::Since(Some(today));
        }
        if self.patches_devices() {
            remediated.last_patch_date = Freshness::Since(Some(today));
        }
        remediated
    }
}

impl std::fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projected effect of one remediation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub action: RemediationAction,
    pub projected: ViolationSet,
    pub current_score: f64,
    pub projected_score: f64,
    /// `projected_score - current_score`.
    pub score_delta: f64,
}

/// Simulate `action` against `dataset` without touching the original.
pub fn simulate(
    dataset: &NormalizedDataset,
    config: &ThresholdConfig,
    action: RemediationAction,
    today: NaiveDate,
) -> ScenarioOutcome {
    let current_score = run_scan(dataset, config, today).compliance_score();

    let remediated = NormalizedDataset {
        records: dataset
            .records
            .iter()
            .map(|record| action.apply(record, today))
            .collect(),
        ..dataset.clone()
    };
    let projected = run_scan(&remediated, config, today);
    let projected_score = projected.compliance_score();

    ScenarioOutcome {
        action,
        projected,
        current_score,
        projected_score,
        score_delta: projected_score - current_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ViolationKind;
    use crate::threshold::RiskSensitivity;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn dataset() -> NormalizedDataset {
        NormalizedDataset::canonical(vec![
            Record {
                id: "U1".to_string(),
                department: "IT".to_string(),
                mfa_enabled: false,
                last_password_change: Freshness::Since(None),
                last_patch_date: Freshness::Since(None),
            },
            Record {
                id: "U2".to_string(),
                department: "HR".to_string(),
                mfa_enabled: false,
                last_password_change: Freshness::Since(Some(today())),
                last_patch_date: Freshness::Since(Some(today())),
            },
            Record {
                id: "U3".to_string(),
                department: "HR".to_string(),
                mfa_enabled: true,
                last_password_change: Freshness::Since(Some(today())),
                last_patch_date: Freshness::AgeDays(400),
            },
        ])
    }

    fn config() -> ThresholdConfig {
        ThresholdConfig::new(90, 30, true, RiskSensitivity::Medium).unwrap()
    }

    #[test]
    fn enforce_mfa_removes_only_mfa_violations() {
        let outcome = simulate(&dataset(), &config(), RemediationAction::EnforceMfa, today());

        assert_eq!(outcome.projected.of_kind(ViolationKind::MfaMissing).count(), 0);
        assert_eq!(outcome.projected.of_kind(ViolationKind::PasswordExpired).count(), 1);
        assert_eq!(outcome.projected.of_kind(ViolationKind::UnpatchedDevice).count(), 2);
        assert_eq!(outcome.current_score, 0.0);
        // U1 and U3 still violate; U2 is fixed.
        assert!((outcome.projected_score - 100.0 / 3.0).abs() < 1e-9);
        assert!((outcome.score_delta - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn patch_all_devices_resets_legacy_ages() {
        let outcome = simulate(&dataset(), &config(), RemediationAction::PatchAllDevices, today());
        assert_eq!(outcome.projected.of_kind(ViolationKind::UnpatchedDevice).count(), 0);
        assert_eq!(outcome.projected.of_kind(ViolationKind::MfaMissing).count(), 2);
    }

    #[test]
    fn full_remediation_clears_everything() {
        let outcome = simulate(&dataset(), &config(), RemediationAction::FullRemediation, today());
        assert!(outcome.projected.is_empty());
        assert_eq!(outcome.projected_score, 100.0);
        assert_eq!(outcome.score_delta, 100.0);
    }

    #[test]
    fn simulate_leaves_input_untouched() {
        let original = dataset();
        let snapshot = original.clone();
        let first = simulate(&original, &config(), RemediationAction::ResetAllPasswords, today());
        let second = simulate(&original, &config(), RemediationAction::ResetAllPasswords, today());
        assert_eq!(original, snapshot);
        assert_eq!(first, second);
    }

    #[test]
    fn action_names_match_wire_format() {
        for action in RemediationAction::ALL {
            let wire = serde_json::to_value(action).unwrap();
            assert_eq!(wire, serde_json::Value::from(action.as_str()));
            let parsed: RemediationAction = serde_json::from_value(wire).unwrap();
            assert_eq!(parsed, action);
        }
        assert!(serde_json::from_str::<RemediationAction>("\"DeleteEveryone\"").is_err());
    }
}
