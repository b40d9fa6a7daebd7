use chrono::{NaiveDate, Utc};
use compliance_core::trend::ComplianceTrend;
use tokio::sync::RwLock;

/// Process-wide compliance trend.
///
/// The core treats trends as plain values; this store owns the current one
/// for the lifetime of the service. Designed to be wrapped in `Arc` and
/// shared across handlers.
pub struct TrendStore {
    trend: RwLock<ComplianceTrend>,
}

impl TrendStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            trend: RwLock::new(ComplianceTrend::new()),
        }
    }

    /// Record a score for `date`, replacing any earlier score for that day.
    pub async fn record(&self, date: NaiveDate, compliance_score: f64) {
        let mut trend = self.trend.write().await;
        *trend = trend.record(date, compliance_score);
    }

    /// Record a score against the server's current UTC date. The evaluation
    /// date a caller pins for a scan never back-dates a trend point.
    pub async fn record_today(&self, compliance_score: f64) {
        self.record(Utc::now().date_naive(), compliance_score).await;
    }

    /// Snapshot of the current trend.
    pub async fn snapshot(&self) -> ComplianceTrend {
        self.trend.read().await.clone()
    }
}

impl Default for TrendStore {
    fn default() -> Self {
        Self::new()
    }
}
