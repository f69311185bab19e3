//! USB printer transport.
//!
//! The printer is matched by vendor and product id and its first bulk OUT
//! endpoint is used. Claiming the interface makes the handle exclusive, so
//! it is released on every disconnect path.

use super::PrinterTransport;
use crate::error::{HardwareError, Result};
use tracing::error;

#[cfg(feature = "hardware-usb")]
use std::sync::Arc;

/// Claimed USB interface.
#[cfg(feature = "hardware-usb")]
struct Claimed {
    handle: Arc<rusb::DeviceHandle<rusb::GlobalContext>>,
    interface: u8,
    endpoint: u8,
}

/// USB receipt printer.
pub struct UsbTransport {
    vendor_id: u16,
    product_id: u16,
    label: String,
    #[cfg(feature = "hardware-usb")]
    claimed: Option<Claimed>,
    #[cfg(not(feature = "hardware-usb"))]
    claimed: Option<std::convert::Infallible>,
}

impl UsbTransport {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            label: format!("usb {vendor_id:04x}:{product_id:04x}"),
            claimed: None,
        }
    }
}

impl std::fmt::Debug for UsbTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbTransport")
            .field("vendor_id", &self.vendor_id)
            .field("product_id", &self.product_id)
            .field("connected", &self.claimed.is_some())
            .finish()
    }
}

#[cfg(feature = "hardware-usb")]
impl PrinterTransport for UsbTransport {
    fn device(&self) -> &str {
        &self.label
    }

    fn is_connected(&self) -> bool {
        self.claimed.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.claimed.is_some() {
            return Ok(());
        }

        tracing::info!(device = %self.label, "Claiming USB printer");

        let (vendor_id, product_id) = (self.vendor_id, self.product_id);
        let label = self.label.clone();
        let claimed = tokio::task::spawn_blocking(move || claim(&label, vendor_id, product_id))
            .await
            .map_err(|e| HardwareError::connect_failed(&self.label, e.to_string()))??;

        tracing::info!(
            device = %self.label,
            interface = claimed.interface,
            endpoint = claimed.endpoint,
            "USB printer claimed"
        );
        self.claimed = Some(claimed);
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        use posdeck_core::constants::DEVICE_WRITE_TIMEOUT_MS;
        use std::time::Duration;

        let claimed = self
            .claimed
            .as_ref()
            .ok_or_else(|| HardwareError::not_connected(&self.label))?;

        let handle = Arc::clone(&claimed.handle);
        let endpoint = claimed.endpoint;
        let data = bytes.to_vec();
        let timeout = Duration::from_millis(DEVICE_WRITE_TIMEOUT_MS);

        let written = tokio::task::spawn_blocking(move || {
            let mut offset = 0;
            while offset < data.len() {
                offset += handle.write_bulk(endpoint, &data[offset..], timeout)?;
            }
            Ok::<_, rusb::Error>(())
        })
        .await;

        let reason = match written {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };

        error!(device = %self.label, "Failed to write to USB printer: {}", reason);
        self.disconnect().await;
        Err(HardwareError::send_failed(&self.label, reason))
    }

    async fn disconnect(&mut self) {
        if let Some(claimed) = self.claimed.take() {
            if let Err(e) = claimed.handle.release_interface(claimed.interface) {
                tracing::debug!(device = %self.label, "Release interface failed: {}", e);
            }
            tracing::info!(device = %self.label, "USB printer released");
        }
    }
}

#[cfg(feature = "hardware-usb")]
fn claim(label: &str, vendor_id: u16, product_id: u16) -> Result<Claimed> {
    use rusb::{Direction, TransferType};

    let mut handle = rusb::open_device_with_vid_pid(vendor_id, product_id)
        .ok_or_else(|| HardwareError::unavailable(label, "no matching device, or access denied"))?;

    let config = handle
        .device()
        .active_config_descriptor()
        .map_err(|e| map_usb_error(label, e))?;

    let (interface, endpoint) = config
        .interfaces()
        .flat_map(|interface| interface.descriptors())
        .find_map(|descriptor| {
            descriptor
                .endpoint_descriptors()
                .find(|ep| {
                    ep.direction() == Direction::Out && ep.transfer_type() == TransferType::Bulk
                })
                .map(|ep| (descriptor.interface_number(), ep.address()))
        })
        .ok_or_else(|| HardwareError::unavailable(label, "no bulk OUT endpoint"))?;

    // Not supported on every platform.
    let _ = handle.set_auto_detach_kernel_driver(true);

    handle
        .claim_interface(interface)
        .map_err(|e| map_usb_error(label, e))?;

    Ok(Claimed {
        handle: Arc::new(handle),
        interface,
        endpoint,
    })
}

#[cfg(feature = "hardware-usb")]
fn map_usb_error(label: &str, err: rusb::Error) -> HardwareError {
    match err {
        rusb::Error::Access => HardwareError::permission_denied(label, err.to_string()),
        rusb::Error::NoDevice | rusb::Error::NotFound => {
            HardwareError::unavailable(label, err.to_string())
        }
        rusb::Error::Busy => HardwareError::connect_failed(label, "interface claimed elsewhere"),
        _ => HardwareError::connect_failed(label, err.to_string()),
    }
}

#[cfg(not(feature = "hardware-usb"))]
impl PrinterTransport for UsbTransport {
    fn device(&self) -> &str {
        &self.label
    }

    fn is_connected(&self) -> bool {
        false
    }

    async fn connect(&mut self) -> Result<()> {
        error!(device = %self.label, "USB support not compiled in");
        Err(HardwareError::unavailable(&self.label, "USB support is not enabled in this build"))
    }

    async fn send(&mut self, _bytes: &[u8]) -> Result<()> {
        Err(HardwareError::not_connected(&self.label))
    }

    async fn disconnect(&mut self) {}
}
