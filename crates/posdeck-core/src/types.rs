use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a recognised code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
    /// Keyboard-wedge barcode scanner.
    Barcode,
    /// Camera QR reader.
    Qr,
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Barcode => write!(f, "barcode"),
            Self::Qr => write!(f, "qr"),
        }
    }
}

/// A discrete code recognised by a scanner or the QR reader.
///
/// Scan events are delivered to subscribers and never stored by this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub code: String,
    pub source: ScanSource,
    pub timestamp: DateTime<Utc>,
}

impl ScanEvent {
    /// Create a scan event stamped with the current time.
    pub fn new(code: impl Into<String>, source: ScanSource) -> Self {
        Self {
            code: code.into(),
            source,
            timestamp: Utc::now(),
        }
    }

    pub fn barcode(code: impl Into<String>) -> Self {
        Self::new(code, ScanSource::Barcode)
    }

    pub fn qr(code: impl Into<String>) -> Self {
        Self::new(code, ScanSource::Qr)
    }
}

/// Kind of peripheral known to the hardware layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    Printer,
    Scanner,
    QrReader,
    CashDrawer,
    Touchscreen,
}

impl DeviceKind {
    /// All device kinds in report order.
    pub const ALL: [DeviceKind; 5] = [
        Self::Printer,
        Self::Scanner,
        Self::QrReader,
        Self::CashDrawer,
        Self::Touchscreen,
    ];

    /// Human-readable device name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Printer => "Receipt Printer",
            Self::Scanner => "Barcode Scanner",
            Self::QrReader => "QR Reader",
            Self::CashDrawer => "Cash Drawer",
            Self::Touchscreen => "Touchscreen",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Printer => write!(f, "printer"),
            Self::Scanner => write!(f, "scanner"),
            Self::QrReader => write!(f, "qr-reader"),
            Self::CashDrawer => write!(f, "cash-drawer"),
            Self::Touchscreen => write!(f, "touchscreen"),
        }
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "printer" => Ok(Self::Printer),
            "scanner" => Ok(Self::Scanner),
            "qr-reader" | "qr" => Ok(Self::QrReader),
            "cash-drawer" | "drawer" => Ok(Self::CashDrawer),
            "touchscreen" => Ok(Self::Touchscreen),
            other => Err(format!("Unknown device kind: {other}")),
        }
    }
}
