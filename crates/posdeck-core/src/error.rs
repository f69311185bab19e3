use thiserror::Error;

/// Errors raised while loading or validating a hardware configuration.
///
/// A configuration that fails validation is rejected as a whole at the
/// facade boundary; the previously active configuration stays in place.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {device} configuration: {field} {reason}")]
    InvalidField {
        device: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("Malformed configuration: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a new invalid field error.
    pub fn invalid(device: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            device,
            field,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
