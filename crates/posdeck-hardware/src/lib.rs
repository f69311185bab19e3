//! Point-of-sale peripheral layer for posdeck terminals.
//!
//! This crate drives the devices attached to a checkout terminal: receipt
//! printers over USB, serial or TCP, keyboard-wedge barcode scanners, camera
//! QR readers, printer-driven cash drawers and touchscreens. The rest of the
//! application talks to a single [`HardwareFacade`] and never to a device
//! directly.
//!
//! # Design Philosophy
//!
//! - **Printing never fails**: a receipt that cannot reach the device is
//!   rendered as a human-readable document instead. See [`printer`].
//! - **Async-first**: transports and camera sources use native `async fn`
//!   in traits, dispatched through enums rather than trait objects.
//! - **Probes are side-effect free**: [`HardwareFacade::check_all`] never
//!   prints, kicks a drawer or starts a camera.
//! - **Observers are explicit**: every subscription returns a
//!   [`ListenerId`] that removes exactly that listener.
//!
//! # Barcode Scanning
//!
//! Keyboard-wedge scanners type the code and press Enter. Feed key events
//! to the facade and subscribe to completed scans:
//!
//! ```
//! use posdeck_core::{HardwareConfiguration, ScannerConfig};
//! use posdeck_hardware::HardwareFacade;
//! use posdeck_hardware::barcode::KeyEvent;
//! use std::time::{Duration, Instant};
//!
//! let config = HardwareConfiguration {
//!     scanner: ScannerConfig { enabled: true, threshold_ms: 100 },
//!     ..HardwareConfiguration::default()
//! };
//! let facade = HardwareFacade::new(config).unwrap();
//! facade.on_barcode_scan(|scan| println!("scanned {}", scan.code));
//!
//! let t0 = Instant::now();
//! facade.handle_key(&KeyEvent::char('9', t0));
//! let done = facade.handle_key(&KeyEvent::enter(t0 + Duration::from_millis(10)));
//! assert_eq!(done.scan().unwrap().code, "9");
//! ```
//!
//! # Native Transports
//!
//! USB and serial printers need the `hardware-usb` and `hardware-serial`
//! features. Without them those printers report as unavailable and receipts
//! fall back to the rendered document. Network printers need no feature.
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides a recording printer transport, a camera
//! source with injectable frames and a scripted QR decoder for tests and
//! for running without hardware.

pub mod barcode;
pub mod capabilities;
pub mod devices;
pub mod error;
pub mod facade;
pub mod listeners;
pub mod mock;
pub mod printer;
pub mod qr;
pub mod status;
pub mod transport;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use facade::{HardwareFacade, HardwareFacadeBuilder};
pub use listeners::{ListenerId, ListenerRegistry};
pub use printer::{PrintMedium, PrintOutcome, PrinterService, TransportFactory};

// Re-export status types
pub use status::{
    DeviceState, DeviceStatus, DeviceStatusAggregator, HardwareStatusSnapshot, OverallStatus,
    TestResult,
};
