use std::sync::Arc;

use crate::config::ServerConfig;
use crate::trend::TrendStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration, including default thresholds.
    pub config: Arc<ServerConfig>,
    /// Compliance score history for this process.
    pub trend: Arc<TrendStore>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            trend: Arc::new(TrendStore::new()),
        }
    }
}
