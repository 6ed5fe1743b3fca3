#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid name pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown deployment mode: {0}")]
    UnknownMode(String),

    #[error("No deployment mode selected")]
    NoActiveMode,

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
