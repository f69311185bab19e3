//! Device health reporting.
//!
//! [`DeviceStatusAggregator::check_all`] answers "what is usable right now"
//! without side effects: nothing prints, no drawer opens and no camera
//! starts. The only I/O is a short TCP connect to a network printer.
//! Snapshots are cached for a TTL so dashboards can poll freely.
//!
//! [`test_device`] is the explicit counterpart that does perform the real
//! action for a single device.

use crate::capabilities::PlatformCapabilities;
use crate::error::HardwareError;
use crate::printer::{PrintMedium, PrinterService};
use crate::transport::probe_reachable;
use chrono::{DateTime, Utc};
use posdeck_core::constants::{REACHABILITY_PROBE_TIMEOUT_MS, STATUS_CACHE_TTL_MS};
use posdeck_core::{DeviceKind, HardwareConfiguration, PrinterTransportConfig};
use posdeck_escpos::ReceiptDocument;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Availability of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceState {
    Connected,
    Disconnected,
    Available,
    NotConfigured,
    Error,
}

impl DeviceState {
    /// Connected or available.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Connected | Self::Available)
    }
}

/// Status of one device at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub name: String,
    pub kind: DeviceKind,
    pub state: DeviceState,
    pub message: String,
    pub last_checked: DateTime<Utc>,
}

impl DeviceStatus {
    fn new(kind: DeviceKind, state: DeviceState, message: impl Into<String>) -> Self {
        Self {
            name: kind.display_name().to_string(),
            kind,
            state,
            message: message.into(),
            last_checked: Utc::now(),
        }
    }

    fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// Summary over every device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverallStatus {
    AllConnected,
    Partial,
    None,
}

/// Derive the overall status: all-connected when every device is usable,
/// none when no device is, partial otherwise.
pub fn derive_overall(devices: &[DeviceStatus]) -> OverallStatus {
    let usable = devices.iter().filter(|d| d.state.is_usable()).count();
    if usable == 0 {
        OverallStatus::None
    } else if usable == devices.len() {
        OverallStatus::AllConnected
    } else {
        OverallStatus::Partial
    }
}

/// Status of every device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareStatusSnapshot {
    pub devices: Vec<DeviceStatus>,
    pub overall: OverallStatus,
    pub checked_at: DateTime<Utc>,
}

impl HardwareStatusSnapshot {
    pub fn new(devices: Vec<DeviceStatus>) -> Self {
        Self {
            overall: derive_overall(&devices),
            devices,
            checked_at: Utc::now(),
        }
    }

    pub fn device(&self, kind: DeviceKind) -> Option<&DeviceStatus> {
        self.devices.iter().find(|d| d.kind == kind)
    }
}

/// Probes devices and caches the resulting snapshot.
#[derive(Debug)]
pub struct DeviceStatusAggregator {
    ttl: Duration,
    probe_timeout: Duration,
    cached: Option<(Instant, Arc<HardwareStatusSnapshot>)>,
}

impl DeviceStatusAggregator {
    pub fn new() -> Self {
        Self {
            ttl: Duration::from_millis(STATUS_CACHE_TTL_MS),
            probe_timeout: Duration::from_millis(REACHABILITY_PROBE_TIMEOUT_MS),
            cached: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Cached snapshot if younger than the TTL, else a fresh probe.
    ///
    /// Never fails: probe failures become device states.
    pub async fn check_all(
        &mut self,
        config: &HardwareConfiguration,
        caps: &dyn PlatformCapabilities,
    ) -> Arc<HardwareStatusSnapshot> {
        if let Some((taken_at, snapshot)) = &self.cached
            && taken_at.elapsed() < self.ttl
        {
            return Arc::clone(snapshot);
        }

        let devices = vec![
            self.probe_printer(config, caps).await,
            probe_scanner(config),
            probe_qr_reader(config, caps),
            probe_cash_drawer(config),
            probe_touchscreen(config, caps),
        ];
        let snapshot = Arc::new(HardwareStatusSnapshot::new(devices));

        debug!(overall = ?snapshot.overall, "Hardware status probed");
        self.cached = Some((Instant::now(), Arc::clone(&snapshot)));
        snapshot
    }

    /// Force the next [`check_all`](Self::check_all) to probe again.
    pub fn clear_cache(&mut self) {
        self.cached = None;
    }

    async fn probe_printer(
        &self,
        config: &HardwareConfiguration,
        caps: &dyn PlatformCapabilities,
    ) -> DeviceStatus {
        let Some(printer) = &config.printer else {
            return DeviceStatus::new(
                DeviceKind::Printer,
                DeviceState::NotConfigured,
                "No printer configured",
            );
        };

        let status = match &printer.transport {
            PrinterTransportConfig::Usb { .. } => {
                selectable_printer(&printer.transport, caps.usb_supported(), "USB")
            }
            PrinterTransportConfig::Serial { .. } => {
                selectable_printer(&printer.transport, caps.serial_supported(), "Serial")
            }
            PrinterTransportConfig::Network { host, port } => {
                match probe_reachable(host, *port, self.probe_timeout).await {
                    Ok(()) => DeviceStatus::new(
                        DeviceKind::Printer,
                        DeviceState::Connected,
                        format!("Reachable at {host}:{port}"),
                    ),
                    Err(HardwareError::Timeout { duration_ms }) => DeviceStatus::new(
                        DeviceKind::Printer,
                        DeviceState::Disconnected,
                        format!("No response from {host}:{port} within {duration_ms}ms"),
                    ),
                    Err(e) => DeviceStatus::new(
                        DeviceKind::Printer,
                        DeviceState::Disconnected,
                        format!("Unreachable: {e}"),
                    ),
                }
            }
            PrinterTransportConfig::HumanReadable => DeviceStatus::new(
                DeviceKind::Printer,
                DeviceState::Available,
                "Receipts are rendered for the print dialog",
            ),
        };

        status.named(&printer.name)
    }
}

impl Default for DeviceStatusAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// USB and serial printers cannot be probed without claiming the device, so
/// they are reported available whenever the platform can reach them.
fn selectable_printer(
    transport: &PrinterTransportConfig,
    supported: bool,
    bus: &str,
) -> DeviceStatus {
    if supported {
        DeviceStatus::new(
            DeviceKind::Printer,
            DeviceState::Available,
            format!("{transport} selected, connects on first print"),
        )
    } else {
        DeviceStatus::new(
            DeviceKind::Printer,
            DeviceState::Error,
            format!("{bus} access is not available on this platform"),
        )
    }
}

fn probe_scanner(config: &HardwareConfiguration) -> DeviceStatus {
    if config.scanner.enabled {
        DeviceStatus::new(
            DeviceKind::Scanner,
            DeviceState::Available,
            "Scan a barcode to verify",
        )
    } else {
        DeviceStatus::new(
            DeviceKind::Scanner,
            DeviceState::NotConfigured,
            "Barcode scanner disabled",
        )
    }
}

fn probe_qr_reader(
    config: &HardwareConfiguration,
    caps: &dyn PlatformCapabilities,
) -> DeviceStatus {
    if !config.qr_reader.enabled {
        DeviceStatus::new(
            DeviceKind::QrReader,
            DeviceState::NotConfigured,
            "QR reader disabled",
        )
    } else if !caps.camera_supported() {
        DeviceStatus::new(
            DeviceKind::QrReader,
            DeviceState::Error,
            "Camera capture is not available on this platform",
        )
    } else {
        DeviceStatus::new(
            DeviceKind::QrReader,
            DeviceState::Available,
            "Camera capture available",
        )
    }
}

fn probe_cash_drawer(config: &HardwareConfiguration) -> DeviceStatus {
    let drawer = &config.cash_drawer;
    if !drawer.enabled {
        return DeviceStatus::new(
            DeviceKind::CashDrawer,
            DeviceState::NotConfigured,
            "Cash drawer disabled",
        );
    }
    if !drawer.via_printer {
        return DeviceStatus::new(
            DeviceKind::CashDrawer,
            DeviceState::NotConfigured,
            "Direct cash drawer connection is not supported",
        );
    }
    if config.printer.is_none() {
        DeviceStatus::new(
            DeviceKind::CashDrawer,
            DeviceState::Error,
            "Cash drawer is routed through a printer but no printer is configured",
        )
    } else {
        DeviceStatus::new(
            DeviceKind::CashDrawer,
            DeviceState::Available,
            "Opens through the receipt printer",
        )
    }
}

fn probe_touchscreen(
    config: &HardwareConfiguration,
    caps: &dyn PlatformCapabilities,
) -> DeviceStatus {
    let touch = caps.touch_supported();
    let (state, message) = match (config.touchscreen.enabled, touch) {
        (true, true) => (DeviceState::Connected, "Touch input detected"),
        (true, false) => (DeviceState::Disconnected, "No touch input detected"),
        (false, true) => (DeviceState::Available, "Touch input detected, not enabled"),
        (false, false) => (DeviceState::NotConfigured, "No touch input detected"),
    };
    DeviceStatus::new(DeviceKind::Touchscreen, state, message)
}

/// Outcome of [`test_device`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub kind: DeviceKind,
    pub success: bool,
    pub message: String,
}

impl TestResult {
    fn new(kind: DeviceKind, success: bool, message: impl Into<String>) -> Self {
        Self {
            kind,
            success,
            message: message.into(),
        }
    }
}

/// Exercise one device for real.
///
/// The printer prints a one-item sample receipt and the cash drawer opens.
/// Scanners have no synthetic input, so their test asks for a manual scan.
pub async fn test_device(
    kind: DeviceKind,
    config: &HardwareConfiguration,
    printer: &mut PrinterService,
    caps: &dyn PlatformCapabilities,
) -> TestResult {
    info!(device = %kind, "Testing device");

    match kind {
        DeviceKind::Printer => {
            if config.printer.is_none() {
                return TestResult::new(kind, false, "No printer configured");
            }
            let outcome = printer.print_receipt(&ReceiptDocument::sample()).await;
            match outcome.medium {
                PrintMedium::Device => TestResult::new(kind, true, "Test receipt printed"),
                PrintMedium::HumanReadable => {
                    TestResult::new(kind, true, "Test receipt rendered for the print dialog")
                }
                PrintMedium::Fallback { reason } => TestResult::new(
                    kind,
                    false,
                    format!("Printer unavailable, test receipt rendered instead: {reason}"),
                ),
            }
        }
        DeviceKind::CashDrawer => match printer.open_cash_drawer(&config.cash_drawer).await {
            Ok(()) => TestResult::new(kind, true, "Cash drawer opened"),
            Err(e) => TestResult::new(kind, false, e.to_string()),
        },
        DeviceKind::Scanner => {
            if config.scanner.enabled {
                TestResult::new(kind, true, "Scan any barcode to verify the scanner")
            } else {
                TestResult::new(kind, false, "Barcode scanner is not enabled")
            }
        }
        DeviceKind::QrReader => {
            if !config.qr_reader.enabled {
                TestResult::new(kind, false, "QR reader is not enabled")
            } else if !caps.camera_supported() {
                TestResult::new(
                    kind,
                    false,
                    "Camera capture is not available on this platform",
                )
            } else {
                TestResult::new(
                    kind,
                    true,
                    "Start a QR scan and present a code to the camera",
                )
            }
        }
        DeviceKind::Touchscreen => {
            if caps.touch_supported() {
                TestResult::new(kind, true, "Touch input detected")
            } else {
                TestResult::new(kind, false, "No touch input detected")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilitySet;
    use crate::mock::MockTransportHandle;
    use posdeck_core::{
        CashDrawerConfig, PrinterConfig, QrReaderConfig, ScannerConfig, TouchscreenConfig,
    };
    use rstest::rstest;
    use tokio::net::TcpListener;

    fn status(state: DeviceState) -> DeviceStatus {
        DeviceStatus::new(DeviceKind::Scanner, state, "")
    }

    fn config_with_printer(transport: PrinterTransportConfig) -> HardwareConfiguration {
        HardwareConfiguration {
            printer: Some(PrinterConfig::new(transport)),
            ..HardwareConfiguration::default()
        }
    }

    #[rstest]
    #[case(&[DeviceState::Available, DeviceState::Available], OverallStatus::AllConnected)]
    #[case(&[DeviceState::Connected, DeviceState::Available], OverallStatus::AllConnected)]
    #[case(&[DeviceState::Available, DeviceState::Error], OverallStatus::Partial)]
    #[case(&[DeviceState::Disconnected, DeviceState::Connected], OverallStatus::Partial)]
    #[case(&[DeviceState::NotConfigured, DeviceState::Error], OverallStatus::None)]
    #[case(&[DeviceState::Disconnected], OverallStatus::None)]
    fn test_derive_overall(#[case] states: &[DeviceState], #[case] expected: OverallStatus) {
        let devices: Vec<DeviceStatus> = states.iter().copied().map(status).collect();
        assert_eq!(derive_overall(&devices), expected);
    }

    #[tokio::test]
    async fn test_empty_configuration() {
        let mut aggregator = DeviceStatusAggregator::new();
        let snapshot = aggregator
            .check_all(&HardwareConfiguration::default(), &CapabilitySet::none())
            .await;

        assert_eq!(snapshot.devices.len(), DeviceKind::ALL.len());
        assert!(
            snapshot
                .devices
                .iter()
                .all(|d| d.state == DeviceState::NotConfigured)
        );
        assert_eq!(snapshot.overall, OverallStatus::None);
    }

    #[tokio::test]
    async fn test_everything_available() {
        let config = HardwareConfiguration {
            printer: Some(PrinterConfig::new(PrinterTransportConfig::HumanReadable)),
            scanner: ScannerConfig {
                enabled: true,
                ..ScannerConfig::default()
            },
            qr_reader: QrReaderConfig {
                enabled: true,
                ..QrReaderConfig::default()
            },
            cash_drawer: CashDrawerConfig {
                enabled: true,
                via_printer: true,
            },
            touchscreen: TouchscreenConfig { enabled: false },
        };
        let mut aggregator = DeviceStatusAggregator::new();

        let snapshot = aggregator.check_all(&config, &CapabilitySet::all()).await;

        assert_eq!(snapshot.overall, OverallStatus::AllConnected);
        assert_eq!(
            snapshot.device(DeviceKind::Touchscreen).unwrap().state,
            DeviceState::Available
        );
        assert_eq!(
            snapshot.device(DeviceKind::Printer).unwrap().name,
            "Receipt Printer"
        );
    }

    #[rstest]
    #[case(true, DeviceState::Available)]
    #[case(false, DeviceState::Error)]
    #[tokio::test]
    async fn test_usb_printer_state(#[case] usb: bool, #[case] expected: DeviceState) {
        let config = config_with_printer(PrinterTransportConfig::Usb {
            vendor_id: 0x04b8,
            product_id: 0x0202,
        });
        let caps = CapabilitySet::none().with_usb(usb);

        let snapshot = DeviceStatusAggregator::new()
            .check_all(&config, &caps)
            .await;

        let printer = snapshot.device(DeviceKind::Printer).unwrap();
        assert_eq!(printer.state, expected);
    }

    #[tokio::test]
    async fn test_serial_printer_follows_capability() {
        let config = config_with_printer(PrinterTransportConfig::Serial {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
        });

        let snapshot = DeviceStatusAggregator::new()
            .check_all(&config, &CapabilitySet::none().with_serial(true))
            .await;

        assert_eq!(
            snapshot.device(DeviceKind::Printer).unwrap().state,
            DeviceState::Available
        );
    }

    #[tokio::test]
    async fn test_qr_reader_without_camera_is_error() {
        let config = HardwareConfiguration {
            qr_reader: QrReaderConfig {
                enabled: true,
                ..QrReaderConfig::default()
            },
            ..HardwareConfiguration::default()
        };

        let snapshot = DeviceStatusAggregator::new()
            .check_all(&config, &CapabilitySet::none())
            .await;

        assert_eq!(
            snapshot.device(DeviceKind::QrReader).unwrap().state,
            DeviceState::Error
        );
    }

    #[rstest]
    #[case(false, false, false, DeviceState::NotConfigured)]
    #[case(true, false, true, DeviceState::NotConfigured)]
    #[case(true, true, false, DeviceState::Error)]
    #[case(true, true, true, DeviceState::Available)]
    fn test_cash_drawer_rules(
        #[case] enabled: bool,
        #[case] via_printer: bool,
        #[case] has_printer: bool,
        #[case] expected: DeviceState,
    ) {
        let config = HardwareConfiguration {
            printer: has_printer.then(|| PrinterConfig::new(PrinterTransportConfig::HumanReadable)),
            cash_drawer: CashDrawerConfig {
                enabled,
                via_printer,
            },
            ..HardwareConfiguration::default()
        };

        assert_eq!(probe_cash_drawer(&config).state, expected);
    }

    #[rstest]
    #[case(true, true, DeviceState::Connected)]
    #[case(true, false, DeviceState::Disconnected)]
    #[case(false, true, DeviceState::Available)]
    #[case(false, false, DeviceState::NotConfigured)]
    fn test_touchscreen_rules(
        #[case] enabled: bool,
        #[case] touch: bool,
        #[case] expected: DeviceState,
    ) {
        let config = HardwareConfiguration {
            touchscreen: TouchscreenConfig { enabled },
            ..HardwareConfiguration::default()
        };
        let caps = CapabilitySet::none().with_touch(touch);

        assert_eq!(probe_touchscreen(&config, &caps).state, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_cached_within_ttl() {
        let mut aggregator = DeviceStatusAggregator::new();
        let config = HardwareConfiguration::default();
        let caps = CapabilitySet::none();

        let first = aggregator.check_all(&config, &caps).await;
        tokio::time::advance(Duration::from_millis(4_000)).await;
        let second = aggregator.check_all(&config, &caps).await;
        assert!(Arc::ptr_eq(&first, &second));

        tokio::time::advance(Duration::from_millis(1_500)).await;
        let third = aggregator.check_all(&config, &caps).await;
        assert!(!Arc::ptr_eq(&second, &third));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_forces_probe() {
        let mut aggregator = DeviceStatusAggregator::new();
        let config = HardwareConfiguration::default();
        let caps = CapabilitySet::none();

        let first = aggregator.check_all(&config, &caps).await;
        aggregator.clear_cache();
        let second = aggregator.check_all(&config, &caps).await;

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_device_printer_reports_fallback_as_failure() {
        let handle = MockTransportHandle::new();
        handle.fail_connect("offline");
        let config = config_with_printer(PrinterTransportConfig::Network {
            host: "10.0.0.5".to_string(),
            port: 9100,
        });
        let mut printer = PrinterService::with_factory(config.printer.clone(), handle.factory());
        let caps = CapabilitySet::none();

        let result = test_device(DeviceKind::Printer, &config, &mut printer, &caps).await;

        assert!(!result.success);
        assert!(result.message.contains("offline"));
    }

    #[tokio::test]
    async fn test_device_printer_prints_sample() {
        let handle = MockTransportHandle::new();
        let config = config_with_printer(PrinterTransportConfig::Network {
            host: "10.0.0.5".to_string(),
            port: 9100,
        });
        let mut printer = PrinterService::with_factory(config.printer.clone(), handle.factory());
        let caps = CapabilitySet::none();

        let result = test_device(DeviceKind::Printer, &config, &mut printer, &caps).await;

        assert!(result.success);
        let printed = String::from_utf8_lossy(&handle.sent_bytes()).to_string();
        assert!(printed.contains("TEST PRINT"));
    }

    #[tokio::test]
    async fn test_device_cash_drawer_without_printer_fails() {
        let config = HardwareConfiguration {
            cash_drawer: CashDrawerConfig {
                enabled: true,
                via_printer: true,
            },
            ..HardwareConfiguration::default()
        };
        let mut printer = PrinterService::new(None);
        let caps = CapabilitySet::none();

        let result = test_device(DeviceKind::CashDrawer, &config, &mut printer, &caps).await;

        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_device_scanner_asks_for_manual_scan() {
        let config = HardwareConfiguration {
            scanner: ScannerConfig {
                enabled: true,
                ..ScannerConfig::default()
            },
            ..HardwareConfiguration::default()
        };
        let mut printer = PrinterService::new(None);
        let caps = CapabilitySet::none();

        let result = test_device(DeviceKind::Scanner, &config, &mut printer, &caps).await;

        assert!(result.success);
        assert!(result.message.contains("Scan"));
    }

    fn network_printer(port: u16) -> HardwareConfiguration {
        config_with_printer(PrinterTransportConfig::Network {
            host: "127.0.0.1".to_string(),
            port,
        })
    }

    #[tokio::test]
    async fn test_network_printer_listening_is_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut aggregator =
            DeviceStatusAggregator::new().with_probe_timeout(Duration::from_millis(500));

        let snapshot = aggregator
            .check_all(&network_printer(port), &CapabilitySet::none())
            .await;

        let printer = snapshot.device(DeviceKind::Printer).unwrap();
        assert_eq!(printer.state, DeviceState::Connected);
        assert_eq!(printer.message, format!("Reachable at 127.0.0.1:{port}"));
        assert_eq!(snapshot.overall, OverallStatus::Partial);
    }

    #[tokio::test]
    async fn test_network_printer_closed_port_is_disconnected() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut aggregator =
            DeviceStatusAggregator::new().with_probe_timeout(Duration::from_millis(500));

        let snapshot = aggregator
            .check_all(&network_printer(port), &CapabilitySet::none())
            .await;

        let printer = snapshot.device(DeviceKind::Printer).unwrap();
        assert_eq!(printer.state, DeviceState::Disconnected);
        assert_eq!(printer.name, "Receipt Printer");
        assert_eq!(snapshot.overall, OverallStatus::None);
    }

    #[tokio::test]
    async fn test_snapshot_serializes_kebab_case() {
        let snapshot = DeviceStatusAggregator::new()
            .check_all(&HardwareConfiguration::default(), &CapabilitySet::none())
            .await;

        let json = serde_json::to_value(&*snapshot).unwrap();

        assert_eq!(json["overall"], "none");
        let devices = json["devices"].as_array().unwrap();
        assert_eq!(devices.len(), DeviceKind::ALL.len());
        assert_eq!(json["devices"][0]["kind"], "printer");
        assert_eq!(json["devices"][0]["state"], "not-configured");
        assert!(json["checked_at"].is_string());
    }

    #[test]
    fn test_result_serializes_device_kind() {
        let result = TestResult::new(DeviceKind::CashDrawer, true, "Cash drawer opened");

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "kind": "cash-drawer",
                "success": true,
                "message": "Cash drawer opened",
            })
        );
    }
}
