//! Serial printer transport.
//!
//! The port is always the one named in the configuration. Discovery through
//! [`list_serial_ports`] only feeds an explicit selection by the operator;
//! the transport never picks a port on its own.

use super::PrinterTransport;
use crate::error::{HardwareError, Result};
use serde::Serialize;
use tracing::error;

/// A serial port offered for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerialPortEntry {
    pub name: String,
    pub description: String,
}

/// Serial printer at a fixed baud rate.
pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    label: String,
    #[cfg(feature = "hardware-serial")]
    port: Option<Box<dyn serialport::SerialPort>>,
    #[cfg(not(feature = "hardware-serial"))]
    port: Option<std::convert::Infallible>,
}

impl SerialTransport {
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        let port_name = port_name.into();
        Self {
            label: format!("serial {port_name}@{baud_rate}"),
            port_name,
            baud_rate,
            port: None,
        }
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port_name", &self.port_name)
            .field("baud_rate", &self.baud_rate)
            .field("connected", &self.port.is_some())
            .finish()
    }
}

#[cfg(feature = "hardware-serial")]
impl PrinterTransport for SerialTransport {
    fn device(&self) -> &str {
        &self.label
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        use posdeck_core::constants::DEVICE_WRITE_TIMEOUT_MS;
        use std::time::Duration;

        if self.port.is_some() {
            return Ok(());
        }

        tracing::info!(device = %self.label, "Opening serial port");

        let builder = serialport::new(self.port_name.as_str(), self.baud_rate)
            .timeout(Duration::from_millis(DEVICE_WRITE_TIMEOUT_MS));
        let port = tokio::task::spawn_blocking(move || builder.open())
            .await
            .map_err(|e| HardwareError::connect_failed(&self.label, e.to_string()))?
            .map_err(|e| map_open_error(&self.label, e))?;

        self.port = Some(port);
        tracing::info!(device = %self.label, "Serial port opened");
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        use std::io::Write;

        let mut port = self
            .port
            .take()
            .ok_or_else(|| HardwareError::not_connected(&self.label))?;
        let data = bytes.to_vec();

        let joined = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&data).and_then(|()| port.flush());
            (port, result)
        })
        .await;

        match joined {
            Ok((port, Ok(()))) => {
                self.port = Some(port);
                Ok(())
            }
            Ok((_port, Err(e))) => {
                error!(device = %self.label, "Failed to write to serial port: {}", e);
                Err(HardwareError::send_failed(&self.label, e.to_string()))
            }
            Err(e) => Err(HardwareError::send_failed(&self.label, e.to_string())),
        }
    }

    async fn disconnect(&mut self) {
        if self.port.take().is_some() {
            tracing::info!(device = %self.label, "Serial port closed");
        }
    }
}

#[cfg(feature = "hardware-serial")]
fn map_open_error(device: &str, err: serialport::Error) -> HardwareError {
    match err.kind() {
        serialport::ErrorKind::NoDevice => HardwareError::unavailable(device, err.to_string()),
        serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
            HardwareError::permission_denied(device, err.to_string())
        }
        _ => HardwareError::connect_failed(device, err.to_string()),
    }
}

#[cfg(not(feature = "hardware-serial"))]
impl PrinterTransport for SerialTransport {
    fn device(&self) -> &str {
        &self.label
    }

    fn is_connected(&self) -> bool {
        false
    }

    async fn connect(&mut self) -> Result<()> {
        error!(device = %self.label, "Serial support not compiled in");
        Err(HardwareError::unavailable(&self.label, "serial support is not enabled in this build"))
    }

    async fn send(&mut self, _bytes: &[u8]) -> Result<()> {
        Err(HardwareError::not_connected(&self.label))
    }

    async fn disconnect(&mut self) {}
}

/// Enumerate serial ports for operator selection.
#[cfg(feature = "hardware-serial")]
pub fn list_serial_ports() -> Result<Vec<SerialPortEntry>> {
    let ports = serialport::available_ports()
        .map_err(|e| HardwareError::unavailable("serial ports", e.to_string()))?;

    Ok(ports
        .into_iter()
        .map(|info| {
            let description = match info.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    let product = usb.product.unwrap_or_else(|| "USB serial".to_string());
                    format!("{product} ({:04x}:{:04x})", usb.vid, usb.pid)
                }
                serialport::SerialPortType::PciPort => "PCI serial".to_string(),
                serialport::SerialPortType::BluetoothPort => "Bluetooth serial".to_string(),
                serialport::SerialPortType::Unknown => "Serial port".to_string(),
            };
            SerialPortEntry {
                name: info.port_name,
                description,
            }
        })
        .collect())
}

/// Enumerate serial ports for operator selection.
#[cfg(not(feature = "hardware-serial"))]
pub fn list_serial_ports() -> Result<Vec<SerialPortEntry>> {
    Err(HardwareError::unavailable(
        "serial ports",
        "serial support is not enabled in this build",
    ))
}
