//! Threshold configuration for a single analysis run.
//!
//! [`ThresholdSettings`] is the raw, user-facing shape (deserialized from
//! requests or environment). [`ThresholdConfig`] can only be obtained by
//! validating settings, so the evaluator never sees out-of-range limits.

use serde::{de, Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smallest accepted password age limit, in days.
pub const MIN_PASSWORD_AGE_LIMIT_DAYS: i64 = 30;
/// Largest accepted password age limit, in days.
pub const MAX_PASSWORD_AGE_LIMIT_DAYS: i64 = 180;
/// Smallest accepted patch age limit, in days.
pub const MIN_PATCH_AGE_LIMIT_DAYS: i64 = 7;
/// Largest accepted patch age limit, in days.
pub const MAX_PATCH_AGE_LIMIT_DAYS: i64 = 90;

pub const DEFAULT_PASSWORD_AGE_LIMIT_DAYS: i64 = 90;
pub const DEFAULT_PATCH_AGE_LIMIT_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Risk sensitivity
// ---------------------------------------------------------------------------

/// Operator-selected risk appetite.
///
/// Accepted and carried through every run; severities do not scale with it
/// yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskSensitivity {
    Low,
    #[default]
    Medium,
    High,
    Extreme,
}

impl RiskSensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }

    /// Parse a sensitivity name (case-insensitive). Returns `None` for
    /// unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "extreme" => Some(Self::Extreme),
            _ => None,
        }
    }

    /// All valid sensitivity values.
    pub const ALL: &'static [&'static str] = &["low", "medium", "high", "extreme"];
}

/// Accepts any casing, same as [`RiskSensitivity::from_str`].
impl<'de> Deserialize<'de> for RiskSensitivity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).ok_or_else(|| de::Error::unknown_variant(&raw, Self::ALL))
    }
}

impl std::fmt::Display for RiskSensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Settings / config
// ---------------------------------------------------------------------------

/// Unvalidated threshold values as supplied by a user or environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ThresholdSettings {
    #[validate(range(min = 30, max = 180, message = "must be between 30 and 180 days"))]
    pub password_age_limit_days: i64,
    #[validate(range(min = 7, max = 90, message = "must be between 7 and 90 days"))]
    pub patch_age_limit_days: i64,
    pub mfa_mandatory: bool,
    #[serde(default)]
    pub risk_sensitivity: RiskSensitivity,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            password_age_limit_days: DEFAULT_PASSWORD_AGE_LIMIT_DAYS,
            patch_age_limit_days: DEFAULT_PATCH_AGE_LIMIT_DAYS,
            mfa_mandatory: true,
            risk_sensitivity: RiskSensitivity::Medium,
        }
    }
}

/// Validated, immutable thresholds for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdSettings", into = "ThresholdSettings")]
pub struct ThresholdConfig {
    password_age_limit_days: i64,
    patch_age_limit_days: i64,
    mfa_mandatory: bool,
    risk_sensitivity: RiskSensitivity,
}

impl ThresholdConfig {
    /// Build a config, rejecting limits outside the accepted ranges.
    pub fn new(
        password_age_limit_days: i64,
        patch_age_limit_days: i64,
        mfa_mandatory: bool,
        risk_sensitivity: RiskSensitivity,
    ) -> Result<Self, CoreError> {
        Self::try_from(ThresholdSettings {
            password_age_limit_days,
            patch_age_limit_days,
            mfa_mandatory,
            risk_sensitivity,
        })
    }

    pub fn password_age_limit_days(&self) -> i64 {
        self.password_age_limit_days
    }

    pub fn patch_age_limit_days(&self) -> i64 {
        self.patch_age_limit_days
    }

    pub fn mfa_mandatory(&self) -> bool {
        self.mfa_mandatory
    }

    pub fn risk_sensitivity(&self) -> RiskSensitivity {
        self.risk_sensitivity
    }

    /// The raw settings this config was built from.
    pub fn settings(&self) -> ThresholdSettings {
        ThresholdSettings::from(*self)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            password_age_limit_days: DEFAULT_PASSWORD_AGE_LIMIT_DAYS,
            patch_age_limit_days: DEFAULT_PATCH_AGE_LIMIT_DAYS,
            mfa_mandatory: true,
            risk_sensitivity: RiskSensitivity::Medium,
        }
    }
}

impl TryFrom<ThresholdSettings> for ThresholdConfig {
    type Error = CoreError;

    fn try_from(settings: ThresholdSettings) -> Result<Self, Self::Error> {
        settings
            .validate()
            .map_err(|errors| CoreError::InvalidConfig(describe_errors(&errors)))?;
        Ok(Self {
            password_age_limit_days: settings.password_age_limit_days,
            patch_age_limit_days: settings.patch_age_limit_days,
            mfa_mandatory: settings.mfa_mandatory,
            risk_sensitivity: settings.risk_sensitivity,
        })
    }
}

impl From<ThresholdConfig> for ThresholdSettings {
    fn from(config: ThresholdConfig) -> Self {
        Self {
            password_age_limit_days: config.password_age_limit_days,
            patch_age_limit_days: config.patch_age_limit_days,
            mfa_mandatory: config.mfa_mandatory,
            risk_sensitivity: config.risk_sensitivity,
        }
    }
}

/// Flatten validator output into `"<field> <message>"` clauses, sorted by
/// field name so the message is stable.
fn describe_errors(errors: &validator::ValidationErrors) -> String {
    let mut clauses: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                format!("{field} {message}")
            })
        })
        .collect();
    clauses.sort();
    clauses.join("; ")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn default_config_matches_default_settings() {
        let config = ThresholdConfig::try_from(ThresholdSettings::default()).unwrap();
        assert_eq!(config, ThresholdConfig::default());
        assert_eq!(config.password_age_limit_days(), 90);
        assert_eq!(config.patch_age_limit_days(), 30);
        assert!(config.mfa_mandatory());
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(ThresholdConfig::new(30, 7, true, RiskSensitivity::Low).is_ok());
        assert!(ThresholdConfig::new(180, 90, false, RiskSensitivity::Extreme).is_ok());
    }

    #[test]
    fn rejects_password_limit_out_of_range() {
        let err = ThresholdConfig::new(29, 30, true, RiskSensitivity::Medium).unwrap_err();
        assert_matches!(err, CoreError::InvalidConfig(msg) if msg.contains("password_age_limit_days"));
    }

    #[test]
    fn rejects_negative_patch_limit() {
        let err = ThresholdConfig::new(90, -1, true, RiskSensitivity::Medium).unwrap_err();
        assert_matches!(err, CoreError::InvalidConfig(msg) if msg.contains("patch_age_limit_days"));
    }

    #[test]
    fn reports_every_offending_field() {
        let err = ThresholdConfig::new(500, 200, true, RiskSensitivity::High).unwrap_err();
        let CoreError::InvalidConfig(msg) = err else {
            panic!("expected InvalidConfig");
        };
        assert!(msg.contains("password_age_limit_days must be between 30 and 180 days"));
        assert!(msg.contains("patch_age_limit_days must be between 7 and 90 days"));
    }

    #[test]
    fn deserialize_validates_ranges() {
        let ok: ThresholdConfig = serde_json::from_str(
            r#"{"password_age_limit_days": 60, "patch_age_limit_days": 14, "mfa_mandatory": false}"#,
        )
        .unwrap();
        assert_eq!(ok.risk_sensitivity(), RiskSensitivity::Medium);
        assert!(!ok.mfa_mandatory());

        let bad = serde_json::from_str::<ThresholdConfig>(
            r#"{"password_age_limit_days": 10, "patch_age_limit_days": 14, "mfa_mandatory": false}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn sensitivity_parses_case_insensitively() {
        assert_eq!(RiskSensitivity::from_str("EXTREME"), Some(RiskSensitivity::Extreme));
        assert_eq!(RiskSensitivity::from_str(" low "), Some(RiskSensitivity::Low));
        assert_eq!(RiskSensitivity::from_str("paranoid"), None);
        assert_eq!(RiskSensitivity::ALL.len(), 4);
    }

    #[test]
    fn sensitivity_deserializes_any_casing() {
        let parsed: RiskSensitivity = serde_json::from_str(r#""High""#).unwrap();
        assert_eq!(parsed, RiskSensitivity::High);
        let parsed: RiskSensitivity = serde_json::from_str(r#""EXTREME""#).unwrap();
        assert_eq!(parsed, RiskSensitivity::Extreme);
        assert_eq!(
            serde_json::to_value(RiskSensitivity::Extreme).unwrap(),
            serde_json::json!("extreme")
        );

        let err = serde_json::from_str::<RiskSensitivity>(r#""paranoid""#).unwrap_err();
        assert!(err.to_string().contains("unknown variant `paranoid`"));
    }
}
