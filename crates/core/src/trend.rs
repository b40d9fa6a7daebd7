//! Compliance score history.
//!
//! A [`ComplianceTrend`] is a plain value: recording a point returns a new
//! trend. Whoever owns the session decides where the trend lives.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Score observed on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub compliance_score: f64,
}

/// Scores over time, at most one per day, sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceTrend {
    pub points: Vec<TrendPoint>,
}

impl ComplianceTrend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a trend with `score` recorded for `date`. A later score for
    /// the same day replaces the earlier one.
    pub fn record(&self, date: NaiveDate, compliance_score: f64) -> Self {
        let mut points: Vec<TrendPoint> = self
            .points
            .iter()
            .filter(|p| p.date != date)
            .copied()
            .collect();
        let at = points.partition_point(|p| p.date < date);
        points.insert(
            at,
            TrendPoint {
                date,
                compliance_score,
            },
        );
        Self { points }
    }

    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.last()
    }

    /// Score change between the two most recent days.
    pub fn latest_change(&self) -> Option<f64> {
        match self.points.as_slice() {
            [.., previous, last] => Some(last.compliance_score - previous.compliance_score),
            _ => None,
        }
    }
}
