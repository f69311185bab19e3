//! Hardware configuration value types.
//!
//! The settings collaborator hands a complete [`HardwareConfiguration`] to the
//! facade, which validates it once and then treats it as immutable until the
//! next wholesale replacement. Each printer transport is a tagged variant so
//! that an unusable combination (a network printer without a host, a USB
//! printer without ids) is rejected before any device is touched.
//!
//! # JSON Format
//!
//! ```
//! use posdeck_core::config::{HardwareConfiguration, PrinterTransportConfig};
//!
//! let json = r#"{
//!     "printer": { "transport": "network", "host": "192.168.0.50" },
//!     "scanner": { "enabled": true },
//!     "cash_drawer": { "enabled": true, "via_printer": true }
//! }"#;
//!
//! let config = HardwareConfiguration::from_json_str(json).unwrap();
//! let printer = config.printer.as_ref().unwrap();
//! assert_eq!(
//!     printer.transport,
//!     PrinterTransportConfig::Network { host: "192.168.0.50".into(), port: 9100 }
//! );
//! assert_eq!(config.scanner.threshold_ms, 100);
//! ```

use crate::constants::{
    DEFAULT_NETWORK_PRINTER_PORT, DEFAULT_QR_SCAN_INTERVAL_MS, DEFAULT_SCAN_THRESHOLD_MS,
    DEFAULT_SERIAL_BAUD_RATE,
};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

fn default_baud_rate() -> u32 {
    DEFAULT_SERIAL_BAUD_RATE
}

fn default_network_port() -> u16 {
    DEFAULT_NETWORK_PRINTER_PORT
}

fn default_threshold_ms() -> u64 {
    DEFAULT_SCAN_THRESHOLD_MS
}

fn default_scan_interval_ms() -> u64 {
    DEFAULT_QR_SCAN_INTERVAL_MS
}

fn default_printer_name() -> String {
    "Receipt Printer".to_string()
}

/// Aggregate configuration of every peripheral attached to a terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareConfiguration {
    /// Receipt printer, if one is attached.
    #[serde(default)]
    pub printer: Option<PrinterConfig>,

    /// Keyboard-wedge barcode scanner.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Camera-based QR reader.
    #[serde(default)]
    pub qr_reader: QrReaderConfig,

    /// Cash drawer.
    #[serde(default)]
    pub cash_drawer: CashDrawerConfig,

    /// Touchscreen display.
    #[serde(default)]
    pub touchscreen: TouchscreenConfig,
}

impl HardwareConfiguration {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] for JSON that does not match the
    /// schema and [`ConfigError::InvalidField`] for values rejected by
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Configuration with only a human-readable printer, useful as a safe
    /// default when nothing has been configured yet.
    pub fn human_readable_only() -> Self {
        Self {
            printer: Some(PrinterConfig::new(PrinterTransportConfig::HumanReadable)),
            ..Self::default()
        }
    }

    /// Check every device section for values no transport could use.
    pub fn validate(&self) -> Result<()> {
        if let Some(printer) = &self.printer {
            printer.validate()?;
        }

        if self.scanner.threshold_ms == 0 {
            return Err(ConfigError::invalid("scanner", "threshold_ms", "must be greater than 0"));
        }

        if self.qr_reader.scan_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "qr_reader",
                "scan_interval_ms",
                "must be greater than 0",
            ));
        }

        if let Some(camera_id) = &self.qr_reader.camera_id
            && camera_id.trim().is_empty()
        {
            return Err(ConfigError::invalid(
                "qr_reader",
                "camera_id",
                "must not be empty when set",
            ));
        }

        Ok(())
    }
}

/// Receipt printer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// Display name used in status reports.
    #[serde(default = "default_printer_name")]
    pub name: String,

    /// How protocol bytes reach the printer.
    #[serde(flatten)]
    pub transport: PrinterTransportConfig,
}

impl PrinterConfig {
    /// Create a printer configuration with the default display name.
    pub fn new(transport: PrinterTransportConfig) -> Self {
        Self {
            name: default_printer_name(),
            transport,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn validate(&self) -> Result<()> {
        match &self.transport {
            PrinterTransportConfig::Usb {
                vendor_id,
                product_id,
            } => {
                if *vendor_id == 0 {
                    return Err(ConfigError::invalid("printer", "vendor_id", "must not be 0"));
                }
                if *product_id == 0 {
                    return Err(ConfigError::invalid("printer", "product_id", "must not be 0"));
                }
            }
            PrinterTransportConfig::Serial { port, baud_rate } => {
                if port.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        "printer",
                        "port",
                        "must name a selected serial port",
                    ));
                }
                if *baud_rate == 0 {
                    return Err(ConfigError::invalid("printer", "baud_rate", "must not be 0"));
                }
            }
            PrinterTransportConfig::Network { host, port } => {
                if host.trim().is_empty() {
                    return Err(ConfigError::invalid("printer", "host", "must not be empty"));
                }
                if *port == 0 {
                    return Err(ConfigError::invalid("printer", "port", "must not be 0"));
                }
            }
            PrinterTransportConfig::HumanReadable => {}
        }
        Ok(())
    }
}

/// Printer transport selection with its connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "kebab-case")]
pub enum PrinterTransportConfig {
    /// USB printer matched by vendor and product id.
    Usb { vendor_id: u16, product_id: u16 },

    /// Serial printer on an explicitly selected port.
    Serial {
        port: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
    },

    /// Raw TCP printer.
    Network {
        host: String,
        #[serde(default = "default_network_port")]
        port: u16,
    },

    /// No device; receipts are rendered as a human-readable document.
    HumanReadable,
}

impl PrinterTransportConfig {
    /// Short transport name used in logs and status messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Usb { .. } => "usb",
            Self::Serial { .. } => "serial",
            Self::Network { .. } => "network",
            Self::HumanReadable => "human-readable",
        }
    }

    /// Whether this transport talks to a physical device.
    pub fn is_device_backed(&self) -> bool {
        !matches!(self, Self::HumanReadable)
    }
}

impl fmt::Display for PrinterTransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usb {
                vendor_id,
                product_id,
            } => write!(f, "usb {vendor_id:04x}:{product_id:04x}"),
            Self::Serial { port, baud_rate } => write!(f, "serial {port}@{baud_rate}"),
            Self::Network { host, port } => write!(f, "network {host}:{port}"),
            Self::HumanReadable => write!(f, "human-readable"),
        }
    }
}

/// Keyboard-wedge barcode scanner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Maximum gap between keystrokes of one scan.
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_ms: default_threshold_ms(),
        }
    }
}

/// Camera QR reader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrReaderConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Specific camera to open; otherwise an environment-facing one is preferred.
    #[serde(default)]
    pub camera_id: Option<String>,

    /// Period of the decode tick.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
}

impl Default for QrReaderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            camera_id: None,
            scan_interval_ms: default_scan_interval_ms(),
        }
    }
}

/// Cash drawer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashDrawerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Drawer is wired to the printer's kick port.
    #[serde(default)]
    pub via_printer: bool,
}

/// Touchscreen configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchscreenConfig {
    #[serde(default)]
    pub enabled: bool,
}
