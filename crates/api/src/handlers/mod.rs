//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource. The
//! handlers normalize uploads, call into `compliance_core`, and map errors
//! via [`AppError`](crate::error::AppError).

pub mod scans;
pub mod scenarios;
pub mod trend;
