#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Schema error: missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
