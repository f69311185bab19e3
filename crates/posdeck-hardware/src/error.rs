//! Error types for hardware operations.
//!
//! Expected unavailability (no printer configured, no camera, a printer that
//! refuses the connection) is reported through these variants so callers can
//! decide between falling back and surfacing the failure. A QR frame that
//! contains no code is not an error at all.

use posdeck_core::ConfigError;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device is not part of the active configuration.
    #[error("Device not configured: {device}")]
    ConfigurationMissing { device: String },

    /// The platform refused access to the device.
    #[error("Permission denied for {device}: {reason}")]
    PermissionDenied { device: String, reason: String },

    /// The device or the capability needed to reach it is absent.
    #[error("Device unavailable: {device} ({reason})")]
    DeviceUnavailable { device: String, reason: String },

    /// Opening the transport failed.
    #[error("Connect failed for {device}: {reason}")]
    ConnectFailed { device: String, reason: String },

    /// Writing to an open transport failed.
    #[error("Send failed for {device}: {reason}")]
    SendFailed { device: String, reason: String },

    /// A send was attempted on a transport that holds no handle.
    #[error("Device not connected: {device}")]
    NotConnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Operation is not supported by this device or wiring.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// The configuration was rejected.
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new configuration missing error.
    pub fn configuration_missing(device: impl Into<String>) -> Self {
        Self::ConfigurationMissing {
            device: device.into(),
        }
    }

    /// Create a new permission denied error.
    pub fn permission_denied(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Create a new device unavailable error.
    pub fn unavailable(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Create a new connect failed error.
    pub fn connect_failed(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Create a new send failed error.
    pub fn send_failed(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SendFailed {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Create a new not connected error.
    pub fn not_connected(device: impl Into<String>) -> Self {
        Self::NotConnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Whether the error means the device could not be reached at all, as
    /// opposed to failing part way through an operation.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing { .. }
                | Self::PermissionDenied { .. }
                | Self::DeviceUnavailable { .. }
                | Self::ConnectFailed { .. }
                | Self::Timeout { .. }
        )
    }
}
