//! Receipt printing with fallback to a human-readable document.
//!
//! Printing a receipt always produces a result; only the medium degrades.
//! A receipt goes to the device when the configured transport connects and
//! accepts every frame. Otherwise it is rendered for an on-screen preview or
//! the OS print dialog. Nothing is retried: a second attempt could print the
//! receipt twice.
//!
//! The cash drawer is different. It has no human-readable substitute, so
//! every failure to kick it is returned to the caller.

use crate::devices::AnyTransport;
use crate::error::{HardwareError, Result};
use crate::transport::PrinterTransport;
use posdeck_core::{CashDrawerConfig, PrinterConfig, PrinterTransportConfig};
use posdeck_escpos::{
    ReceiptDocument, RenderedReceipt, encode, encode_cash_drawer_kick, render_receipt,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds the transport for a device-backed printer configuration.
///
/// Returns `None` when no transport can serve the configuration.
pub type TransportFactory =
    Arc<dyn Fn(&PrinterTransportConfig) -> Option<AnyTransport> + Send + Sync>;

/// Factory producing the native USB, serial and network transports.
pub fn native_transport_factory() -> TransportFactory {
    Arc::new(AnyTransport::from_config)
}

/// Where a receipt ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "medium", rename_all = "kebab-case")]
pub enum PrintMedium {
    /// Every frame was accepted by the printer.
    Device,
    /// The configured printer is the human-readable document.
    HumanReadable,
    /// The device path failed and the document was rendered instead.
    Fallback { reason: String },
}

/// Result of [`PrinterService::print_receipt`].
#[derive(Debug, Clone)]
pub struct PrintOutcome {
    pub medium: PrintMedium,
    /// The rendered document, present unless the receipt went to the device.
    pub rendered: Option<RenderedReceipt>,
}

impl PrintOutcome {
    fn device() -> Self {
        Self {
            medium: PrintMedium::Device,
            rendered: None,
        }
    }

    fn human_readable(doc: &ReceiptDocument) -> Self {
        Self {
            medium: PrintMedium::HumanReadable,
            rendered: Some(render_receipt(doc)),
        }
    }

    fn fallback(doc: &ReceiptDocument, reason: impl Into<String>) -> Self {
        Self {
            medium: PrintMedium::Fallback {
                reason: reason.into(),
            },
            rendered: Some(render_receipt(doc)),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.medium, PrintMedium::Fallback { .. })
    }

    pub fn printed_on_device(&self) -> bool {
        self.medium == PrintMedium::Device
    }

    /// Reason the device path was abandoned.
    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.medium {
            PrintMedium::Fallback { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Owns the printer configuration and its single transport.
///
/// At most one transport exists at a time. Replacing the configuration
/// disconnects it before another can be created.
pub struct PrinterService {
    config: Option<PrinterConfig>,
    transport: Option<AnyTransport>,
    factory: TransportFactory,
}

impl PrinterService {
    /// Create a service using the native transports.
    pub fn new(config: Option<PrinterConfig>) -> Self {
        Self::with_factory(config, native_transport_factory())
    }

    /// Create a service with a custom transport factory.
    pub fn with_factory(config: Option<PrinterConfig>, factory: TransportFactory) -> Self {
        Self {
            config,
            transport: None,
            factory,
        }
    }

    pub fn config(&self) -> Option<&PrinterConfig> {
        self.config.as_ref()
    }

    /// Whether a device handle is currently held.
    pub fn is_connected(&self) -> bool {
        self.transport
            .as_ref()
            .is_some_and(PrinterTransport::is_connected)
    }

    /// Replace the printer configuration.
    ///
    /// A changed configuration releases the current transport first.
    pub async fn set_config(&mut self, config: Option<PrinterConfig>) {
        if self.config == config {
            return;
        }
        self.disconnect().await;
        self.transport = None;
        self.config = config;
    }

    /// Print a receipt, falling back to the rendered document on any failure.
    ///
    /// This never returns an error. Check [`PrintOutcome::medium`] to see
    /// whether the receipt reached the device.
    pub async fn print_receipt(&mut self, doc: &ReceiptDocument) -> PrintOutcome {
        match self.config.as_ref().map(|c| &c.transport) {
            None => {
                warn!("No printer configured, rendering receipt");
                return PrintOutcome::fallback(doc, "no printer configured");
            }
            Some(PrinterTransportConfig::HumanReadable) => {
                debug!(receipt = %doc.receipt_number, "Rendering human-readable receipt");
                return PrintOutcome::human_readable(doc);
            }
            Some(_) => {}
        }

        let transport = match self.acquire().await {
            Ok(transport) => transport,
            Err(e) => {
                warn!("Printer unavailable, falling back to rendered receipt: {e}");
                return PrintOutcome::fallback(doc, e.to_string());
            }
        };

        let frames = encode(doc);
        let mut bytes = 0;
        for frame in &frames {
            if let Err(e) = transport.send(frame.as_bytes()).await {
                warn!(
                    device = %transport.device(),
                    tag = %frame.tag(),
                    "Send failed mid-receipt, falling back: {}",
                    e
                );
                transport.disconnect().await;
                return PrintOutcome::fallback(doc, e.to_string());
            }
            bytes += frame.len();
        }

        info!(
            device = %transport.device(),
            receipt = %doc.receipt_number,
            frames = frames.len(),
            bytes,
            "Receipt printed"
        );
        PrintOutcome::device()
    }

    /// Pulse the cash drawer through the printer.
    ///
    /// # Errors
    ///
    /// Fails when the drawer is disabled, not wired to the printer, no
    /// device-backed printer is configured, or the kick cannot be delivered.
    pub async fn open_cash_drawer(&mut self, drawer: &CashDrawerConfig) -> Result<()> {
        if !drawer.enabled {
            return Err(HardwareError::configuration_missing("cash-drawer"));
        }
        if !drawer.via_printer {
            return Err(HardwareError::unsupported("cash drawer without printer"));
        }

        let transport = self.acquire().await?;
        let kick = encode_cash_drawer_kick();

        if let Err(e) = transport.send(kick.as_bytes()).await {
            warn!(device = %transport.device(), "Cash drawer kick failed: {}", e);
            transport.disconnect().await;
            return Err(e);
        }

        info!(device = %transport.device(), "Cash drawer opened");
        Ok(())
    }

    /// Release the device handle, if any.
    pub async fn disconnect(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.disconnect().await;
        }
    }

    /// Connected transport for the configured printer, reusing a held handle.
    async fn acquire(&mut self) -> Result<&mut AnyTransport> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| HardwareError::configuration_missing("printer"))?;

        if !config.transport.is_device_backed() {
            return Err(HardwareError::unavailable(
                &config.name,
                "human-readable printer has no device",
            ));
        }

        if self.transport.is_none() {
            let created = (self.factory)(&config.transport).ok_or_else(|| {
                HardwareError::unavailable(config.transport.to_string(), "no transport available")
            })?;
            self.transport = Some(created);
        }

        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| HardwareError::configuration_missing("printer"))?;

        if !transport.is_connected() {
            if let Err(e) = transport.connect().await {
                transport.disconnect().await;
                return Err(e);
            }
        }

        Ok(transport)
    }
}

impl std::fmt::Debug for PrinterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterService")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
