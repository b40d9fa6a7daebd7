//! Dataset normalization.
//!
//! Turns a [`RawTable`] into typed [`Record`]s. Two input shapes are
//! accepted:
//!
//! - the canonical shape (`id`, `department`, `mfa_enabled`,
//!   `last_password_change`, `last_patch_date`), and
//! - the legacy shape, keyed off `Password_Age` / `MFA_Enabled` (the
//!   authentication family) and `Patch_Level` (the system security family).
//!
//! The schema is checked for the whole table before any row is read, so a
//! schema problem never yields a partial dataset. Unparseable cells do not
//! fail the run; they become nulls (later treated as maximally stale) and a
//! [`ParseWarning`] is recorded.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::rules::PolicyFamily;
use crate::table::{cell_text, RawRow, RawTable};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Age assigned to missing or unparseable dates so the record is always
/// flagged.
pub const SENTINEL_AGE_DAYS: i64 = 999;

/// Department used when the cell is blank or the column is absent.
pub const DEFAULT_DEPARTMENT: &str = "Unknown";

pub const COL_ID: &str = "id";
pub const COL_DEPARTMENT: &str = "department";
pub const COL_MFA_ENABLED: &str = "mfa_enabled";
pub const COL_LAST_PASSWORD_CHANGE: &str = "last_password_change";
pub const COL_LAST_PATCH_DATE: &str = "last_patch_date";

/// Columns required by the canonical shape.
pub const CANONICAL_COLUMNS: &[&str] = &[
    COL_ID,
    COL_DEPARTMENT,
    COL_MFA_ENABLED,
    COL_LAST_PASSWORD_CHANGE,
    COL_LAST_PATCH_DATE,
];

/// Column names that satisfy the canonical `id` requirement.
pub const ID_COLUMNS: &[&str] = &["id", "user_id"];

pub const LEGACY_PASSWORD_AGE: &str = "Password_Age";
pub const LEGACY_MFA_ENABLED: &str = "MFA_Enabled";
pub const LEGACY_PATCH_LEVEL: &str = "Patch_Level";

/// Identifier columns tried, in order, for legacy tables.
pub const LEGACY_ID_COLUMNS: &[&str] = &["User_ID", "Device_ID", "id", "user_id"];

/// Department columns tried, in order, for legacy tables.
pub const LEGACY_DEPARTMENT_COLUMNS: &[&str] = &["Department", "department"];

/// Legacy patch levels below this are out of date.
pub const LEGACY_MIN_PATCH_LEVEL: f64 = 3.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

const TRUTHY: &[&str] = &["true", "1", "yes"];
const FALSY: &[&str] = &["false", "0", "no"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How recently a field (password, patch) was refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Freshness {
    /// Date of the last refresh. `None` when missing or unparseable.
    Since(Option<NaiveDate>),
    /// Age supplied directly in days by the source.
    AgeDays(i64),
}

impl Freshness {
    /// Age in days as of `today`. Missing dates report [`SENTINEL_AGE_DAYS`].
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        match self {
            Self::Since(Some(date)) => (today - *date).num_days(),
            Self::Since(None) => SENTINEL_AGE_DAYS,
            Self::AgeDays(days) => *days,
        }
    }
}

/// One subject (user or device) under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub department: String,
    pub mfa_enabled: bool,
    pub last_password_change: Freshness,
    pub last_patch_date: Freshness,
}

/// Which input shape a dataset was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Canonical,
    Legacy,
}

/// What kind of value a cell failed to parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Date,
    Boolean,
    Number,
}

/// A non-fatal cell-level parse problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Zero-based row index in the input table.
    pub row_index: usize,
    pub column: String,
    pub value: String,
    pub expected: CellKind,
}

/// Typed records ready for evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDataset {
    pub schema: SchemaKind,
    /// Policy families this dataset carries columns for.
    pub families: Vec<PolicyFamily>,
    pub records: Vec<Record>,
    pub warnings: Vec<ParseWarning>,
}

impl NormalizedDataset {
    /// A canonical dataset built directly from typed records.
    pub fn canonical(records: Vec<Record>) -> Self {
        Self {
            schema: SchemaKind::Canonical,
            families: PolicyFamily::ALL.to_vec(),
            records,
            warnings: Vec::new(),
        }
    }

    /// Whether violations of `family` can be assessed for this dataset.
    pub fn covers(&self, family: PolicyFamily) -> bool {
        self.families.contains(&family)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a raw table, detecting which input shape it uses.
///
/// `required_columns` names the canonical columns the caller needs
/// (normally [`CANONICAL_COLUMNS`]). When any are absent the legacy shape is
/// tried. If that is not satisfiable either, a [`CoreError::Schema`] names
/// the missing legacy columns when the table already uses some of them, and
/// the missing canonical columns otherwise.
pub fn normalize(
    table: &RawTable,
    required_columns: &[&str],
) -> Result<NormalizedDataset, CoreError> {
    let missing: Vec<String> = required_columns
        .iter()
        .filter(|column| !has_canonical_column(table, column))
        .map(|column| column.to_string())
        .collect();

    let dataset = if missing.is_empty() {
        normalize_canonical(table)
    } else if let Some(families) = detect_legacy_families(table) {
        normalize_legacy(table, families)
    } else if let Some(legacy_missing) = missing_legacy_columns(table) {
        return Err(CoreError::Schema {
            missing: legacy_missing,
        });
    } else {
        return Err(CoreError::Schema { missing });
    };

    reject_duplicate_ids(&dataset.records)?;
    Ok(dataset)
}

fn has_canonical_column(table: &RawTable, column: &str) -> bool {
    if column == COL_ID {
        table.first_present(ID_COLUMNS).is_some()
    } else {
        table.has_column(column)
    }
}

/// Return the legacy families present, or `None` if the table has none.
fn detect_legacy_families(table: &RawTable) -> Option<Vec<PolicyFamily>> {
    let mut families = Vec::new();
    if table.has_column(LEGACY_PASSWORD_AGE) && table.has_column(LEGACY_MFA_ENABLED) {
        families.push(PolicyFamily::Authentication);
    }
    if table.has_column(LEGACY_PATCH_LEVEL) {
        families.push(PolicyFamily::SystemSecurity);
    }
    if families.is_empty() {
        None
    } else {
        Some(families)
    }
}

/// For a table that uses some legacy columns but completes no legacy
/// family, name the columns that would complete one.
fn missing_legacy_columns(table: &RawTable) -> Option<Vec<String>> {
    let auth = [LEGACY_PASSWORD_AGE, LEGACY_MFA_ENABLED];
    if !auth.iter().any(|c| table.has_column(c)) {
        return None;
    }
    Some(
        auth.iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect(),
    )
}

fn normalize_canonical(table: &RawTable) -> NormalizedDataset {
    let id_column = table.first_present(ID_COLUMNS).unwrap_or(COL_ID);
    let mut warnings = Vec::new();

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut cells = CellReader {
                row,
                index,
                warnings: &mut warnings,
            };
            Record {
                id: record_id(row, Some(id_column), index),
                department: department(row, Some(COL_DEPARTMENT)),
                mfa_enabled: cells.boolean(COL_MFA_ENABLED),
                last_password_change: Freshness::Since(cells.date(COL_LAST_PASSWORD_CHANGE)),
                last_patch_date: Freshness::Since(cells.date(COL_LAST_PATCH_DATE)),
            }
        })
        .collect();

    NormalizedDataset {
        schema: SchemaKind::Canonical,
        families: PolicyFamily::ALL.to_vec(),
        records,
        warnings,
    }
}

fn normalize_legacy(table: &RawTable, families: Vec<PolicyFamily>) -> NormalizedDataset {
    let id_column = table.first_present(LEGACY_ID_COLUMNS);
    let department_column = table.first_present(LEGACY_DEPARTMENT_COLUMNS);
    let mut warnings = Vec::new();

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut cells = CellReader {
                row,
                index,
                warnings: &mut warnings,
            };
            let password_age = cells
                .number(LEGACY_PASSWORD_AGE)
                .map_or(SENTINEL_AGE_DAYS, |days| days.floor() as i64);
            let patch_age = match cells.number(LEGACY_PATCH_LEVEL) {
                Some(level) if level >= LEGACY_MIN_PATCH_LEVEL => 0,
                _ => SENTINEL_AGE_DAYS,
            };
            Record {
                id: record_id(row, id_column, index),
                department: department(row, department_column),
                mfa_enabled: cells.boolean(LEGACY_MFA_ENABLED),
                last_password_change: Freshness::AgeDays(password_age),
                last_patch_date: Freshness::AgeDays(patch_age),
            }
        })
        .collect();

    NormalizedDataset {
        schema: SchemaKind::Legacy,
        families,
        records,
        warnings,
    }
}

fn reject_duplicate_ids(records: &[Record]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if !seen.insert(record.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "duplicate record id '{}' at row {}",
                record.id,
                index + 1
            )));
        }
    }
    Ok(())
}

fn record_id(row: &RawRow, column: Option<&str>, index: usize) -> String {
    column
        .and_then(|c| cell_text(row, c))
        .unwrap_or_else(|| format!("row-{}", index + 1))
}

fn department(row: &RawRow, column: Option<&str>) -> String {
    column
        .and_then(|c| cell_text(row, c))
        .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string())
}

/// Reads typed cells from one row, collecting warnings for bad values.
struct CellReader<'a> {
    row: &'a RawRow,
    index: usize,
    warnings: &'a mut Vec<ParseWarning>,
}

impl CellReader<'_> {
    fn date(&mut self, column: &str) -> Option<NaiveDate> {
        let text = cell_text(self.row, column)?;
        let parsed = parse_date(&text);
        if parsed.is_none() {
            self.warn(column, text, CellKind::Date);
        }
        parsed
    }

    fn boolean(&mut self, column: &str) -> bool {
        let Some(text) = cell_text(self.row, column) else {
            return false;
        };
        match parse_bool(&text) {
            Some(value) => value,
            None => {
                self.warn(column, text, CellKind::Boolean);
                false
            }
        }
    }

    fn number(&mut self, column: &str) -> Option<f64> {
        let text = cell_text(self.row, column)?;
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                self.warn(column, text, CellKind::Number);
                None
            }
        }
    }

    fn warn(&mut self, column: &str, value: String, expected: CellKind) {
        self.warnings.push(ParseWarning {
            row_index: self.index,
            column: column.to_string(),
            value,
            expected,
        });
    }
}

/// Parse a date leniently across the formats seen in uploads.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

/// Parse a boolean. `true`/`1`/`yes` are true and `false`/`0`/`no` are
/// false (case-insensitive); anything else is unrecognised.
pub fn parse_bool(text: &str) -> Option<bool> {
    let lowered = text.trim().to_ascii_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}
