//! Single entry point for the point-of-sale application.
//!
//! A [`HardwareFacade`] owns the active [`HardwareConfiguration`] and every
//! device component. All methods take `&self`, so one facade can be shared
//! behind an `Arc` by every screen of the application. Components that
//! perform I/O sit behind async mutexes: two print requests queue instead of
//! interleaving their frames on the wire.
//!
//! # Examples
//!
//! ```
//! use posdeck_core::HardwareConfiguration;
//! use posdeck_escpos::ReceiptDocument;
//! use posdeck_hardware::HardwareFacade;
//! use posdeck_hardware::capabilities::CapabilitySet;
//!
//! #[tokio::main]
//! async fn main() -> posdeck_hardware::Result<()> {
//!     let facade = HardwareFacade::builder(HardwareConfiguration::human_readable_only())
//!         .with_capabilities(CapabilitySet::none())
//!         .build()?;
//!
//!     let outcome = facade.print_receipt(&ReceiptDocument::sample()).await;
//!     assert!(outcome.rendered.is_some());
//!     Ok(())
//! }
//! ```

use crate::barcode::{BarcodeInputDecoder, KeyDisposition, KeyEvent};
use crate::capabilities::{NativeCapabilities, PlatformCapabilities};
use crate::error::{HardwareError, Result};
use crate::listeners::{ListenerId, ListenerRegistry};
use crate::printer::{PrintOutcome, PrinterService, TransportFactory, native_transport_factory};
use crate::qr::{
    CameraInfo, CameraSource, NoCamera, QrDecoder, QrScanLoop, RqrrDecoder, ScanRequest, SessionId,
};
use crate::status::{DeviceStatusAggregator, HardwareStatusSnapshot, TestResult, test_device};
use posdeck_core::{DeviceKind, HardwareConfiguration, ScanEvent};
use posdeck_escpos::ReceiptDocument;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hardware abstraction used by the rest of the application.
pub struct HardwareFacade<C: CameraSource = NoCamera, D: QrDecoder = RqrrDecoder> {
    config: RwLock<Arc<HardwareConfiguration>>,
    printer: tokio::sync::Mutex<PrinterService>,
    barcode: Mutex<BarcodeInputDecoder>,
    qr: tokio::sync::Mutex<QrScanLoop<C, D>>,
    status: tokio::sync::Mutex<DeviceStatusAggregator>,
    capabilities: Arc<dyn PlatformCapabilities>,
    barcode_listeners: ListenerRegistry<ScanEvent>,
    qr_listeners: ListenerRegistry<ScanEvent>,
}

impl HardwareFacade {
    /// Facade with native transports, no camera and no touch input.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidConfiguration`] if `config` fails
    /// validation.
    pub fn new(config: HardwareConfiguration) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Returns a new builder for fluent construction.
    pub fn builder(config: HardwareConfiguration) -> HardwareFacadeBuilder {
        HardwareFacadeBuilder {
            config,
            factory: native_transport_factory(),
            camera: NoCamera,
            decoder: RqrrDecoder,
            capabilities: Arc::new(NativeCapabilities::default()),
            status: DeviceStatusAggregator::new(),
        }
    }
}

impl<C: CameraSource, D: QrDecoder> HardwareFacade<C, D> {
    /// The active configuration.
    pub fn config(&self) -> Arc<HardwareConfiguration> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the whole configuration.
    ///
    /// The new value is validated first; on failure the previous
    /// configuration stays active and no component is touched. Otherwise a
    /// changed printer releases its device handle, the barcode decoder drops
    /// any partial scan, a running QR session stops if its camera settings
    /// changed and the status cache is cleared.
    ///
    /// The status lock is held for the whole swap, so concurrent calls apply
    /// one after the other and [`check_all`](Self::check_all) never caches a
    /// snapshot of a configuration that is being replaced.
    pub async fn set_config(&self, config: HardwareConfiguration) -> Result<()> {
        if let Err(e) = config.validate() {
            warn!("Hardware configuration rejected: {}", e);
            return Err(e.into());
        }

        let mut status = self.status.lock().await;
        let config = Arc::new(config);
        let previous = std::mem::replace(
            &mut *self.config.write().unwrap_or_else(PoisonError::into_inner),
            Arc::clone(&config),
        );

        self.printer
            .lock()
            .await
            .set_config(config.printer.clone())
            .await;

        self.barcode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .configure(&config.scanner);

        if previous.qr_reader != config.qr_reader {
            let mut qr = self.qr.lock().await;
            if qr.is_running() {
                debug!("QR reader settings changed, stopping scan");
                qr.stop().await;
            }
        }

        status.clear_cache();

        let printer = config.printer.as_ref().map(|p| p.transport.kind_name());
        info!(
            printer = printer.unwrap_or("none"),
            scanner = config.scanner.enabled,
            qr_reader = config.qr_reader.enabled,
            cash_drawer = config.cash_drawer.enabled,
            "Hardware configuration applied"
        );
        Ok(())
    }

    /// Print a receipt on the configured printer or render it instead.
    pub async fn print_receipt(&self, doc: &ReceiptDocument) -> PrintOutcome {
        self.printer.lock().await.print_receipt(doc).await
    }

    /// Open the cash drawer through the printer.
    ///
    /// # Errors
    ///
    /// See [`PrinterService::open_cash_drawer`].
    pub async fn open_cash_drawer(&self) -> Result<()> {
        let config = self.config();
        self.printer
            .lock()
            .await
            .open_cash_drawer(&config.cash_drawer)
            .await
    }

    /// Feed one keystroke to the barcode decoder.
    ///
    /// A completed scan is delivered to barcode listeners and the Enter key
    /// that completed it is reported as consumed.
    pub fn handle_key(&self, event: &KeyEvent) -> KeyDisposition {
        let disposition = self
            .barcode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handle(event);

        if let Some(scan) = disposition.scan() {
            self.barcode_listeners.emit(scan);
        }
        disposition
    }

    pub fn on_barcode_scan<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ScanEvent) + Send + Sync + 'static,
    {
        self.barcode_listeners.subscribe(listener)
    }

    pub fn unsubscribe_barcode(&self, id: ListenerId) -> bool {
        self.barcode_listeners.unsubscribe(id)
    }

    /// Register a listener for decoded QR payloads.
    ///
    /// Listeners survive stopping and restarting the scan.
    pub fn on_qr_scan<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ScanEvent) + Send + Sync + 'static,
    {
        self.qr_listeners.subscribe(listener)
    }

    pub fn unsubscribe_qr(&self, id: ListenerId) -> bool {
        self.qr_listeners.unsubscribe(id)
    }

    /// Start camera scanning with the configured camera and interval.
    ///
    /// Returns the running session's id if a scan is already active.
    ///
    /// # Errors
    ///
    /// [`HardwareError::ConfigurationMissing`] when the QR reader is
    /// disabled, otherwise whatever opening the camera failed with.
    pub async fn start_qr_scan(&self) -> Result<SessionId> {
        let config = self.config();
        if !config.qr_reader.enabled {
            return Err(HardwareError::configuration_missing("qr-reader"));
        }

        let mut qr = self.qr.lock().await;
        if let Some(id) = qr.session_id() {
            return Ok(id);
        }

        let mut request =
            ScanRequest::new(Duration::from_millis(config.qr_reader.scan_interval_ms));
        if let Some(camera_id) = &config.qr_reader.camera_id {
            request = request.with_camera(camera_id.clone());
        }

        let listeners = self.qr_listeners.clone();
        qr.start(request, move |event| listeners.emit(event)).await
    }

    /// Stop camera scanning and release the camera. Safe when idle.
    pub async fn stop_qr_scan(&self) {
        self.qr.lock().await.stop().await;
    }

    pub async fn is_qr_scanning(&self) -> bool {
        self.qr.lock().await.is_running()
    }

    /// Cameras the QR reader can choose from.
    pub async fn cameras(&self) -> Vec<CameraInfo> {
        self.qr.lock().await.camera().devices()
    }

    /// Status of every device, cached for a few seconds.
    pub async fn check_all(&self) -> Arc<HardwareStatusSnapshot> {
        let mut status = self.status.lock().await;
        let config = self.config();
        status.check_all(&config, self.capabilities.as_ref()).await
    }

    /// Exercise one device for real.
    pub async fn test_device(&self, kind: DeviceKind) -> TestResult {
        let _status = self.status.lock().await;
        let config = self.config();
        let mut printer = self.printer.lock().await;
        test_device(kind, &config, &mut printer, self.capabilities.as_ref()).await
    }

    /// Force the next [`check_all`](Self::check_all) to probe again.
    pub async fn clear_status_cache(&self) {
        self.status.lock().await.clear_cache();
    }

    /// Stop the QR scan and release the printer.
    pub async fn shutdown(&self) {
        self.stop_qr_scan().await;
        self.printer.lock().await.disconnect().await;
        info!("Hardware facade shut down");
    }
}

impl<C: CameraSource, D: QrDecoder> fmt::Debug for HardwareFacade<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareFacade")
            .field("config", &self.config())
            .field("barcode_listeners", &self.barcode_listeners.len())
            .field("qr_listeners", &self.qr_listeners.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`HardwareFacade`].
///
/// Swapping the camera or decoder changes the builder's type parameters, so
/// a facade built with a mock camera is a `HardwareFacade<MockCameraSource>`.
///
/// # Examples
///
/// ```
/// use posdeck_core::HardwareConfiguration;
/// use posdeck_hardware::HardwareFacade;
/// use posdeck_hardware::mock::{MockCameraSource, MockQrDecoder, MockTransportHandle};
///
/// let (camera, _camera_handle) = MockCameraSource::new();
/// let printer = MockTransportHandle::new();
///
/// let facade = HardwareFacade::builder(HardwareConfiguration::default())
///     .with_transport_factory(printer.factory())
///     .with_camera(camera)
///     .with_decoder(MockQrDecoder::new())
///     .build()
///     .unwrap();
///
/// assert!(facade.config().printer.is_none());
/// ```
pub struct HardwareFacadeBuilder<C: CameraSource = NoCamera, D: QrDecoder = RqrrDecoder> {
    config: HardwareConfiguration,
    factory: TransportFactory,
    camera: C,
    decoder: D,
    capabilities: Arc<dyn PlatformCapabilities>,
    status: DeviceStatusAggregator,
}

impl<C: CameraSource, D: QrDecoder> HardwareFacadeBuilder<C, D> {
    /// Build printer transports with `factory` instead of the native ones.
    pub fn with_transport_factory(mut self, factory: TransportFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Use `camera` as the QR reader's camera source.
    pub fn with_camera<C2: CameraSource>(self, camera: C2) -> HardwareFacadeBuilder<C2, D> {
        HardwareFacadeBuilder {
            config: self.config,
            factory: self.factory,
            camera,
            decoder: self.decoder,
            capabilities: self.capabilities,
            status: self.status,
        }
    }

    /// Use `decoder` to find QR codes in camera frames.
    pub fn with_decoder<D2: QrDecoder>(self, decoder: D2) -> HardwareFacadeBuilder<C, D2> {
        HardwareFacadeBuilder {
            config: self.config,
            factory: self.factory,
            camera: self.camera,
            decoder,
            capabilities: self.capabilities,
            status: self.status,
        }
    }

    /// Report platform capabilities from `capabilities`.
    pub fn with_capabilities(mut self, capabilities: impl PlatformCapabilities + 'static) -> Self {
        self.capabilities = Arc::new(capabilities);
        self
    }

    /// Cache status snapshots for `ttl`.
    pub fn with_status_ttl(mut self, ttl: Duration) -> Self {
        self.status = self.status.with_ttl(ttl);
        self
    }

    /// Give up on network printer probes after `timeout`.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.status = self.status.with_probe_timeout(timeout);
        self
    }

    /// Validate the configuration and build the facade.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidConfiguration`] if the configuration
    /// fails validation.
    pub fn build(self) -> Result<HardwareFacade<C, D>> {
        self.config.validate()?;

        Ok(HardwareFacade {
            printer: tokio::sync::Mutex::new(PrinterService::with_factory(
                self.config.printer.clone(),
                self.factory,
            )),
            barcode: Mutex::new(BarcodeInputDecoder::new(&self.config.scanner)),
            qr: tokio::sync::Mutex::new(QrScanLoop::new(self.camera, self.decoder)),
            status: tokio::sync::Mutex::new(self.status),
            capabilities: self.capabilities,
            config: RwLock::new(Arc::new(self.config)),
            barcode_listeners: ListenerRegistry::new(),
            qr_listeners: ListenerRegistry::new(),
        })
    }
}
