pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{
    CashDrawerConfig, HardwareConfiguration, PrinterConfig, PrinterTransportConfig,
    QrReaderConfig, ScannerConfig, TouchscreenConfig,
};
pub use error::{ConfigError, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
