//! Enum wrapper for printer transport dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the printer service
//! holds an [`AnyTransport`] instead of a `Box<dyn PrinterTransport>`.
//!
//! # Examples
//!
//! ```
//! use posdeck_hardware::devices::AnyTransport;
//! use posdeck_hardware::mock::MockTransport;
//! use posdeck_hardware::transport::PrinterTransport;
//!
//! let (transport, _handle) = MockTransport::new();
//! let any = AnyTransport::Mock(transport);
//! assert!(!any.is_connected());
//! ```

use crate::error::Result;
use crate::mock::MockTransport;
use crate::transport::{NetworkTransport, PrinterTransport, SerialTransport, UsbTransport};
use posdeck_core::PrinterTransportConfig;

/// Any printer transport.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    Usb(UsbTransport),
    Serial(SerialTransport),
    Network(NetworkTransport),
    /// Mock transport for development and testing.
    Mock(MockTransport),
}

impl AnyTransport {
    /// Build the native transport for a device-backed configuration.
    ///
    /// Returns `None` for the human-readable variant, which has no device.
    pub fn from_config(config: &PrinterTransportConfig) -> Option<Self> {
        match config {
            PrinterTransportConfig::Usb {
                vendor_id,
                product_id,
            } => Some(Self::Usb(UsbTransport::new(*vendor_id, *product_id))),
            PrinterTransportConfig::Serial { port, baud_rate } => {
                Some(Self::Serial(SerialTransport::new(port.clone(), *baud_rate)))
            }
            PrinterTransportConfig::Network { host, port } => {
                Some(Self::Network(NetworkTransport::new(host.clone(), *port)))
            }
            PrinterTransportConfig::HumanReadable => None,
        }
    }
}

impl PrinterTransport for AnyTransport {
    fn device(&self) -> &str {
        match self {
            Self::Usb(t) => t.device(),
            Self::Serial(t) => t.device(),
            Self::Network(t) => t.device(),
            Self::Mock(t) => t.device(),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            Self::Usb(t) => t.is_connected(),
            Self::Serial(t) => t.is_connected(),
            Self::Network(t) => t.is_connected(),
            Self::Mock(t) => t.is_connected(),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        match self {
            Self::Usb(t) => t.connect().await,
            Self::Serial(t) => t.connect().await,
            Self::Network(t) => t.connect().await,
            Self::Mock(t) => t.connect().await,
        }
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Self::Usb(t) => t.send(bytes).await,
            Self::Serial(t) => t.send(bytes).await,
            Self::Network(t) => t.send(bytes).await,
            Self::Mock(t) => t.send(bytes).await,
        }
    }

    async fn disconnect(&mut self) {
        match self {
            Self::Usb(t) => t.disconnect().await,
            Self::Serial(t) => t.disconnect().await,
            Self::Network(t) => t.disconnect().await,
            Self::Mock(t) => t.disconnect().await,
        }
    }
}
