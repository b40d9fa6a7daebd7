use std::str::FromStr;

use compliance_core::dataset::parse_bool;
use compliance_core::threshold::{
    RiskSensitivity, ThresholdConfig, ThresholdSettings, DEFAULT_PASSWORD_AGE_LIMIT_DAYS,
    DEFAULT_PATCH_AGE_LIMIT_DAYS,
};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Thresholds used when a request does not override them.
    pub default_thresholds: ThresholdConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `PASSWORD_AGE_LIMIT_DAYS` | `90`                       |
    /// | `PATCH_AGE_LIMIT_DAYS`    | `30`                       |
    /// | `MFA_MANDATORY`           | `true`                     |
    /// | `RISK_SENSITIVITY`        | `medium`                   |
    ///
    /// Panics on malformed or out-of-range values so misconfiguration fails
    /// at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_parse("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", 30);

        let risk_sensitivity = match std::env::var("RISK_SENSITIVITY") {
            Ok(raw) => RiskSensitivity::from_str(&raw).unwrap_or_else(|| {
                panic!(
                    "RISK_SENSITIVITY must be one of {}",
                    RiskSensitivity::ALL.join(", ")
                )
            }),
            Err(_) => RiskSensitivity::default(),
        };

        let mfa_mandatory = match std::env::var("MFA_MANDATORY") {
            Ok(raw) => parse_bool(&raw)
                .unwrap_or_else(|| panic!("MFA_MANDATORY must be true/false, yes/no or 1/0")),
            Err(_) => true,
        };

        let settings = ThresholdSettings {
            password_age_limit_days: env_parse(
                "PASSWORD_AGE_LIMIT_DAYS",
                DEFAULT_PASSWORD_AGE_LIMIT_DAYS,
            ),
            patch_age_limit_days: env_parse("PATCH_AGE_LIMIT_DAYS", DEFAULT_PATCH_AGE_LIMIT_DAYS),
            mfa_mandatory,
            risk_sensitivity,
        };
        let default_thresholds = ThresholdConfig::try_from(settings)
            .unwrap_or_else(|e| panic!("Invalid default thresholds: {e}"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            default_thresholds,
        }
    }
}

/// Read and parse an env var, falling back to `default` when unset.
fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
