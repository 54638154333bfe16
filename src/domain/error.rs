//! Domain error types.

/// Top-level error type for portmix.
///
/// Only unexpected failures are errors. Missing price data is reported
/// through [`crate::domain::backtest::DegradedData`] on a successful result.
#[derive(Debug, thiserror::Error)]
pub enum PortmixError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("request parse error: {reason}")]
    RequestParse { reason: String },

    #[error("backtest failed: {reason}")]
    Computation { reason: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PortmixError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        PortmixError::InvalidRequest {
            reason: reason.into(),
        }
    }
}

impl From<&PortmixError> for std::process::ExitCode {
    fn from(err: &PortmixError) -> Self {
        let code: u8 = match err {
            PortmixError::Io(_) => 1,
            PortmixError::ConfigParse { .. }
            | PortmixError::ConfigMissing { .. }
            | PortmixError::ConfigInvalid { .. } => 2,
            PortmixError::Database { .. } | PortmixError::DatabaseQuery { .. } => 3,
            PortmixError::InvalidRequest { .. } | PortmixError::RequestParse { .. } => 4,
            PortmixError::Computation { .. } | PortmixError::Serialization(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
