//! Policy rules and the per-record evaluator.
//!
//! Pure logic: a record, a validated config and the evaluation date go in,
//! violations come out. Severities are fixed per rule kind and staleness
//! tier so repeated runs are reproducible.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::Record;
use crate::threshold::ThresholdConfig;

// ---------------------------------------------------------------------------
// Severity constants
// ---------------------------------------------------------------------------

/// Password older than [`PASSWORD_CRITICAL_AGE_DAYS`].
pub const SEVERITY_PASSWORD_CRITICAL: u8 = 10;
/// Password past the configured limit but not yet critical.
pub const SEVERITY_PASSWORD_EXPIRED: u8 = 8;
pub const SEVERITY_MFA_MISSING: u8 = 10;
pub const SEVERITY_UNPATCHED: u8 = 9;

/// Password ages strictly above this are always critical, whatever the
/// configured limit.
pub const PASSWORD_CRITICAL_AGE_DAYS: i64 = 180;

/// Severity at or above which a violation counts as critical.
pub const CRITICAL_SEVERITY_FLOOR: u8 = 9;
/// Severity counted in the high tier.
pub const HIGH_SEVERITY: u8 = 8;

// ---------------------------------------------------------------------------
// Kinds and families
// ---------------------------------------------------------------------------

/// The policy family a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyFamily {
    Authentication,
    SystemSecurity,
}

impl PolicyFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::SystemSecurity => "system_security",
        }
    }

    /// Every family, in reporting order.
    pub const ALL: [PolicyFamily; 2] = [Self::Authentication, Self::SystemSecurity];
}

impl std::fmt::Display for PolicyFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule a violation breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    PasswordExpired,
    MfaMissing,
    UnpatchedDevice,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordExpired => "PasswordExpired",
            Self::MfaMissing => "MfaMissing",
            Self::UnpatchedDevice => "UnpatchedDevice",
        }
    }

    pub fn family(&self) -> PolicyFamily {
        match self {
            Self::PasswordExpired | Self::MfaMissing => PolicyFamily::Authentication,
            Self::UnpatchedDevice => PolicyFamily::SystemSecurity,
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected rule breach for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub record_id: String,
    pub department: String,
    pub kind: ViolationKind,
    /// Risk weight in `1..=10`.
    pub severity: u8,
    /// Staleness in days; 0 for checks that are not age based.
    pub age_days: i64,
}

impl Violation {
    fn new(record: &Record, kind: ViolationKind, severity: u8, age_days: i64) -> Self {
        Self {
            record_id: record.id.clone(),
            department: record.department.clone(),
            kind,
            severity,
            age_days,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity >= CRITICAL_SEVERITY_FLOOR
    }

    pub fn is_high(&self) -> bool {
        self.severity == HIGH_SEVERITY
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate every rule against one record.
///
/// Checks run in a fixed order (password age, MFA, patch age) and are
/// independent, so a record can produce up to three violations.
pub fn evaluate(record: &Record, config: &ThresholdConfig, today: NaiveDate) -> Vec<Violation> {
    [
        check_password_age(record, config, today),
        check_mfa(record, config),
        check_patch_age(record, config, today),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn check_password_age(
    record: &Record,
    config: &ThresholdConfig,
    today: NaiveDate,
) -> Option<Violation> {
    let age = record.last_password_change.age_days(today);
    if age <= config.password_age_limit_days() {
        return None;
    }
    let severity = if age > PASSWORD_CRITICAL_AGE_DAYS {
        SEVERITY_PASSWORD_CRITICAL
    } else {
        SEVERITY_PASSWORD_EXPIRED
    };
    Some(Violation::new(record, ViolationKind::PasswordExpired, severity, age))
}

fn check_mfa(record: &Record, config: &ThresholdConfig) -> Option<Violation> {
    if config.mfa_mandatory() && !record.mfa_enabled {
        Some(Violation::new(record, ViolationKind::MfaMissing, SEVERITY_MFA_MISSING, 0))
    } else {
        None
    }
}

fn check_patch_age(record: &Record, config: &ThresholdConfig, today: NaiveDate) -> Option<Violation> {
    let age = record.last_patch_date.age_days(today);
    if age > config.patch_age_limit_days() {
        Some(Violation::new(record, ViolationKind::UnpatchedDevice, SEVERITY_UNPATCHED, age))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Freshness, SENTINEL_AGE_DAYS};
    use crate::threshold::RiskSensitivity;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn days_ago(n: i64) -> Freshness {
        Freshness::Since(Some(today() - chrono::Duration::days(n)))
    }

    fn record(mfa: bool, password: Freshness, patch: Freshness) -> Record {
        Record {
            id: "U1".to_string(),
            department: "Finance".to_string(),
            mfa_enabled: mfa,
            last_password_change: password,
            last_patch_date: patch,
        }
    }

    fn config(password: i64, patch: i64, mfa: bool) -> ThresholdConfig {
        ThresholdConfig::new(password, patch, mfa, RiskSensitivity::Medium).unwrap()
    }

    #[test]
    fn expired_password_and_missing_mfa() {
        let r = record(false, days_ago(100), days_ago(10));
        let violations = evaluate(&r, &config(90, 30, true), today());

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].kind, ViolationKind::PasswordExpired);
        assert_eq!(violations[0].severity, SEVERITY_PASSWORD_EXPIRED);
        assert_eq!(violations[0].age_days, 100);
        assert_eq!(violations[1].kind, ViolationKind::MfaMissing);
        assert_eq!(violations[1].severity, 10);
        assert_eq!(violations[1].age_days, 0);
        assert_eq!(violations[1].department, "Finance");
    }

    #[test]
    fn compliant_record_has_no_violations() {
        let r = record(true, days_ago(0), days_ago(0));
        assert!(evaluate(&r, &config(90, 30, true), today()).is_empty());
    }

    #[test]
    fn password_at_limit_is_compliant() {
        let r = record(true, days_ago(90), days_ago(0));
        assert!(evaluate(&r, &config(90, 30, true), today()).is_empty());
    }

    #[test]
    fn password_older_than_critical_age_is_severity_ten() {
        let r = record(true, days_ago(181), days_ago(0));
        let violations = evaluate(&r, &config(90, 30, true), today());
        assert_eq!(violations[0].severity, SEVERITY_PASSWORD_CRITICAL);

        let r = record(true, days_ago(180), days_ago(0));
        let violations = evaluate(&r, &config(90, 30, true), today());
        assert_eq!(violations[0].severity, SEVERITY_PASSWORD_EXPIRED);
    }

    #[test]
    fn missing_dates_use_sentinel_age() {
        let r = record(true, Freshness::Since(None), Freshness::Since(None));
        let violations = evaluate(&r, &config(180, 90, true), today());
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].kind, ViolationKind::PasswordExpired);
        assert_eq!(violations[0].age_days, SENTINEL_AGE_DAYS);
        assert_eq!(violations[0].severity, SEVERITY_PASSWORD_CRITICAL);
        assert_eq!(violations[1].kind, ViolationKind::UnpatchedDevice);
        assert_eq!(violations[1].age_days, SENTINEL_AGE_DAYS);
        assert_eq!(violations[1].severity, SEVERITY_UNPATCHED);
    }

    #[test]
    fn mfa_not_checked_when_optional() {
        let r = record(false, days_ago(0), days_ago(0));
        assert!(evaluate(&r, &config(90, 30, false), today()).is_empty());
    }

    #[test]
    fn future_dates_never_violate() {
        let future = Freshness::Since(Some(today() + chrono::Duration::days(30)));
        let r = record(true, future, future);
        assert!(evaluate(&r, &config(30, 7, true), today()).is_empty());
    }

    #[test]
    fn legacy_age_in_days_is_used_directly() {
        let r = record(true, Freshness::AgeDays(120), Freshness::AgeDays(0));
        let violations = evaluate(&r, &config(90, 30, true), today());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].age_days, 120);
    }

    #[test]
    fn kinds_map_to_families() {
        assert_eq!(ViolationKind::PasswordExpired.family(), PolicyFamily::Authentication);
        assert_eq!(ViolationKind::MfaMissing.family(), PolicyFamily::Authentication);
        assert_eq!(ViolationKind::UnpatchedDevice.family(), PolicyFamily::SystemSecurity);
    }

    #[test]
    fn all_severities_within_range() {
        for severity in [
            SEVERITY_PASSWORD_CRITICAL,
            SEVERITY_PASSWORD_EXPIRED,
            SEVERITY_MFA_MISSING,
            SEVERITY_UNPATCHED,
        ] {
            assert!((1..=10).contains(&severity));
        }
    }
}
