//! Compliance sandbox core.
//!
//! Pure detection and aggregation engine: dataset normalization, rule
//! evaluation, violation aggregation, remediation scenarios, trend tracking
//! and report export. Nothing in this crate performs I/O or reads the clock;
//! callers inject the evaluation date.

pub mod dataset;
pub mod error;
pub mod export;
pub mod rules;
pub mod scan;
pub mod scenario;
pub mod table;
pub mod threshold;
pub mod trend;
