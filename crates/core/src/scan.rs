//! Violation aggregation and summary metrics.
//!
//! [`run_scan`] drives the rule evaluator over every record of one dataset.
//! [`run_batch_scan`] does the same for several named datasets and adds a
//! combined summary.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::NormalizedDataset;
use crate::rules::{evaluate, PolicyFamily, Violation, ViolationKind};
use crate::threshold::ThresholdConfig;

/// Score reported for a dataset with no records.
pub const EMPTY_DATASET_SCORE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Summary statistics for one set of violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_records: usize,
    pub total_violations: usize,
    pub distinct_violating_records: usize,
    /// Violations with severity >= 9.
    pub critical: usize,
    /// Violations with severity == 8.
    pub high: usize,
    /// Violations in neither tier.
    pub other: usize,
    /// `100 × (1 − distinct_violating_records / total_records)`.
    pub compliance_score: f64,
    /// `100 × (1 − total_violations / total_records)`. Counts every
    /// violation row, so records with several violations weigh more.
    pub violation_rate_score: f64,
    /// Mean severity over all violations, two decimals; 0 when none.
    pub average_severity: f64,
    pub by_kind: BTreeMap<ViolationKind, usize>,
    pub by_family: BTreeMap<PolicyFamily, usize>,
    pub by_department: BTreeMap<String, usize>,
}

impl ScanSummary {
    fn from_counts(
        violations: &[Violation],
        total_records: usize,
        distinct_violating_records: usize,
    ) -> Self {
        let critical = violations.iter().filter(|v| v.is_critical()).count();
        let high = violations.iter().filter(|v| v.is_high()).count();

        let mut by_kind = BTreeMap::new();
        let mut by_family = BTreeMap::new();
        let mut by_department = BTreeMap::new();
        for v in violations {
            *by_kind.entry(v.kind).or_insert(0) += 1;
            *by_family.entry(v.kind.family()).or_insert(0) += 1;
            *by_department.entry(v.department.clone()).or_insert(0) += 1;
        }

        Self {
            total_records,
            total_violations: violations.len(),
            distinct_violating_records,
            critical,
            high,
            other: violations.len() - critical - high,
            compliance_score: score(distinct_violating_records, total_records),
            violation_rate_score: score(violations.len(), total_records),
            average_severity: average_severity(violations),
            by_kind,
            by_family,
            by_department,
        }
    }
}

/// All violations from one scan of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationSet {
    /// In input row order; within a record, in check order.
    pub violations: Vec<Violation>,
    pub total_records: usize,
    pub summary: ScanSummary,
}

impl ViolationSet {
    pub fn compliance_score(&self) -> f64 {
        self.summary.compliance_score
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one kind, in scan order.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}

/// A dataset tagged with the name it was uploaded under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedDataset {
    pub name: String,
    pub dataset: NormalizedDataset,
}

/// Result of scanning one named dataset within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetScan {
    pub name: String,
    pub result: ViolationSet,
}

/// Result of scanning several datasets in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchScan {
    pub datasets: Vec<DatasetScan>,
    /// Summary over every dataset's violations and records together.
    pub combined: ScanSummary,
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Evaluate every record of `dataset` and summarize the result.
///
/// Violations of policy families the dataset has no columns for are not
/// reported.
pub fn run_scan(
    dataset: &NormalizedDataset,
    config: &ThresholdConfig,
    today: NaiveDate,
) -> ViolationSet {
    let violations: Vec<Violation> = dataset
        .records
        .iter()
        .flat_map(|record| evaluate(record, config, today))
        .filter(|v| dataset.covers(v.kind.family()))
        .collect();

    let total_records = dataset.records.len();
    let distinct = distinct_records(&violations);
    let summary = ScanSummary::from_counts(&violations, total_records, distinct);

    ViolationSet {
        violations,
        total_records,
        summary,
    }
}

/// Scan each dataset independently, preserving input order, and compute a
/// combined summary.
pub fn run_batch_scan(
    datasets: &[NamedDataset],
    config: &ThresholdConfig,
    today: NaiveDate,
) -> BatchScan {
    let scans: Vec<DatasetScan> = datasets
        .iter()
        .map(|named| DatasetScan {
            name: named.name.clone(),
            result: run_scan(&named.dataset, config, today),
        })
        .collect();

    let all: Vec<Violation> = scans
        .iter()
        .flat_map(|s| s.result.violations.iter().cloned())
        .collect();
    let total_records = scans.iter().map(|s| s.result.total_records).sum();
    // Ids are only unique within a dataset.
    let distinct = scans
        .iter()
        .map(|s| s.result.summary.distinct_violating_records)
        .sum();

    BatchScan {
        combined: ScanSummary::from_counts(&all, total_records, distinct),
        datasets: scans,
    }
}

fn distinct_records(violations: &[Violation]) -> usize {
    violations
        .iter()
        .map(|v| v.record_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn score(failing: usize, total: usize) -> f64 {
    if total == 0 {
        return EMPTY_DATASET_SCORE;
    }
    100.0 * (1.0 - failing as f64 / total as f64)
}

fn average_severity(violations: &[Violation]) -> f64 {
    if violations.is_empty() {
        return 0.0;
    }
    let sum: u32 = violations.iter().map(|v| u32::from(v.severity)).sum();
    let mean = f64::from(sum) / violations.len() as f64;
    (mean * 100.0).round() / 100.0
}
