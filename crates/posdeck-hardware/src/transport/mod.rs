//! Printer transports.
//!
//! A transport owns at most one device handle. `connect` acquires it, `send`
//! writes through it and `disconnect` releases it unconditionally. The
//! human-readable fallback is not a transport: it never holds a handle and is
//! handled by the printer service directly.
//!
//! All traits use native `async fn` methods and are dispatched through
//! [`AnyTransport`](crate::devices::AnyTransport).

#![allow(async_fn_in_trait)]

pub mod network;
pub mod serial;
pub mod usb;

use crate::error::Result;

pub use network::{NetworkTransport, probe_reachable};
pub use serial::{SerialPortEntry, SerialTransport, list_serial_ports};
pub use usb::UsbTransport;

/// Byte channel to a receipt printer.
pub trait PrinterTransport: Send {
    /// Label identifying the device in logs and errors, e.g. `network 10.0.0.5:9100`.
    fn device(&self) -> &str;

    /// Whether a device handle is currently held.
    fn is_connected(&self) -> bool;

    /// Acquire the device handle. Does nothing if already connected.
    async fn connect(&mut self) -> Result<()>;

    /// Write bytes through the held handle.
    ///
    /// # Errors
    ///
    /// [`HardwareError::NotConnected`](crate::HardwareError::NotConnected)
    /// without a handle, [`HardwareError::SendFailed`](crate::HardwareError::SendFailed)
    /// when the write fails. A failed write drops the handle.
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Release the device handle. Idempotent and infallible.
    async fn disconnect(&mut self);
}
