//! End-to-end flows through the hardware facade.
//!
//! Each test wires the facade to mock devices and follows one request from
//! the application's point of view: configure, act, observe.

use posdeck_core::{
    CashDrawerConfig, DeviceKind, HardwareConfiguration, PrinterConfig, PrinterTransportConfig,
    QrReaderConfig, ScanEvent, ScanSource, ScannerConfig,
};
use posdeck_escpos::ReceiptDocument;
use posdeck_hardware::barcode::{Key, KeyDisposition, KeyEvent, Modifiers};
use posdeck_hardware::capabilities::CapabilitySet;
use posdeck_hardware::mock::{MockCameraSource, MockQrDecoder, MockTransportHandle};
use posdeck_hardware::qr::PixelBuffer;
use posdeck_hardware::{DeviceState, HardwareError, HardwareFacade, OverallStatus, PrintMedium};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn checkout_config() -> HardwareConfiguration {
    HardwareConfiguration {
        printer: Some(
            PrinterConfig::new(PrinterTransportConfig::Serial {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 19200,
            })
            .with_name("Front Counter"),
        ),
        scanner: ScannerConfig {
            enabled: true,
            threshold_ms: 100,
        },
        qr_reader: QrReaderConfig {
            enabled: true,
            camera_id: None,
            scan_interval_ms: 250,
        },
        cash_drawer: CashDrawerConfig {
            enabled: true,
            via_printer: true,
        },
        ..HardwareConfiguration::default()
    }
}

fn collector() -> (Arc<Mutex<Vec<String>>>, impl Fn(&ScanEvent) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |event: &ScanEvent| {
        sink.lock().unwrap().push(event.code.clone());
    })
}

#[tokio::test]
async fn test_print_and_open_drawer() {
    let printer = MockTransportHandle::new();
    let facade = HardwareFacade::builder(checkout_config())
        .with_transport_factory(printer.factory())
        .build()
        .unwrap();

    let outcome = facade.print_receipt(&ReceiptDocument::sample()).await;
    assert_eq!(outcome.medium, PrintMedium::Device);

    facade.open_cash_drawer().await.unwrap();
    let sent = printer.sent_bytes();
    assert!(sent.ends_with(&[0x1B, 0x70, 0x00, 0x19, 0xFF]));
    assert_eq!(printer.max_live_handles(), 1);

    facade.shutdown().await;
    assert_eq!(printer.live_handles(), 0);
}

#[tokio::test]
async fn test_drawer_without_printer_fails() {
    let mut config = checkout_config();
    config.printer = None;
    let facade = HardwareFacade::new(config).unwrap();

    let err = facade.open_cash_drawer().await.unwrap_err();
    assert!(matches!(err, HardwareError::ConfigurationMissing { .. }));
}

#[tokio::test]
async fn test_invalid_config_keeps_previous() {
    let facade = HardwareFacade::new(checkout_config()).unwrap();

    let mut broken = checkout_config();
    broken.printer = Some(PrinterConfig::new(PrinterTransportConfig::Network {
        host: String::new(),
        port: 9100,
    }));

    let err = facade.set_config(broken).await.unwrap_err();
    assert!(matches!(err, HardwareError::InvalidConfiguration(_)));
    assert_eq!(*facade.config(), checkout_config());
}

#[tokio::test]
async fn test_barcode_listeners_and_unsubscribe() {
    let facade = HardwareFacade::new(checkout_config()).unwrap();
    let (first, first_listener) = collector();
    let (second, second_listener) = collector();
    let first_id = facade.on_barcode_scan(first_listener);
    facade.on_barcode_scan(second_listener);

    let t0 = Instant::now();
    let ms = Duration::from_millis;
    for (i, c) in "4006381333931".chars().enumerate() {
        let disposition = facade.handle_key(&KeyEvent::char(c, t0 + ms(i as u64 * 5)));
        assert_eq!(disposition, KeyDisposition::Forward);
    }
    let done = facade.handle_key(&KeyEvent::enter(t0 + ms(80)));
    assert_eq!(done.scan().unwrap().source, ScanSource::Barcode);

    assert!(facade.unsubscribe_barcode(first_id));
    assert!(!facade.unsubscribe_barcode(first_id));

    facade.handle_key(&KeyEvent::char('1', t0 + ms(500)));
    facade.handle_key(&KeyEvent::enter(t0 + ms(505)));

    assert_eq!(*first.lock().unwrap(), vec!["4006381333931".to_string()]);
    assert_eq!(
        *second.lock().unwrap(),
        vec!["4006381333931".to_string(), "1".to_string()]
    );
}

#[tokio::test]
async fn test_shortcut_keys_do_not_reach_buffer() {
    let facade = HardwareFacade::new(checkout_config()).unwrap();
    let (seen, listener) = collector();
    facade.on_barcode_scan(listener);

    let t0 = Instant::now();
    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    facade.handle_key(&KeyEvent::new(Key::Char('p'), ctrl, t0));
    let done = facade.handle_key(&KeyEvent::enter(t0 + Duration::from_millis(5)));

    assert_eq!(done, KeyDisposition::Forward);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_disabling_scanner_passes_keys_through() {
    let facade = HardwareFacade::new(checkout_config()).unwrap();
    let mut config = checkout_config();
    config.scanner.enabled = false;
    facade.set_config(config).await.unwrap();

    let t0 = Instant::now();
    facade.handle_key(&KeyEvent::char('5', t0));
    let done = facade.handle_key(&KeyEvent::enter(t0 + Duration::from_millis(5)));

    assert_eq!(done, KeyDisposition::Forward);
}

#[tokio::test(start_paused = true)]
async fn test_qr_listener_survives_restart() {
    let (camera, camera_handle) = MockCameraSource::new();
    let decoder = MockQrDecoder::new();
    let facade = HardwareFacade::builder(checkout_config())
        .with_camera(camera)
        .with_decoder(decoder.clone())
        .build()
        .unwrap();
    let (seen, listener) = collector();
    facade.on_qr_scan(listener);
    camera_handle.set_frame(PixelBuffer::from_luma(2, 2, &[0, 255, 255, 0]).unwrap());

    decoder.push_code("TABLE-7");
    let first = facade.start_qr_scan().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    facade.stop_qr_scan().await;
    assert_eq!(camera_handle.active_sessions(), 0);

    decoder.push_code("TABLE-9");
    let second = facade.start_qr_scan().await.unwrap();
    assert_ne!(first, second);
    tokio::time::sleep(Duration::from_millis(300)).await;
    facade.shutdown().await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["TABLE-7".to_string(), "TABLE-9".to_string()]
    );
    assert_eq!(camera_handle.max_active_sessions(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_status_snapshot_is_cached_until_config_changes() {
    let printer = MockTransportHandle::new();
    let facade = HardwareFacade::builder(checkout_config())
        .with_transport_factory(printer.factory())
        .with_capabilities(CapabilitySet::all())
        .build()
        .unwrap();

    let first = facade.check_all().await;
    assert_eq!(first.overall, OverallStatus::AllConnected);
    let printer_status = first.device(DeviceKind::Printer).unwrap();
    assert_eq!(printer_status.name, "Front Counter");
    assert_eq!(printer_status.state, DeviceState::Available);

    let again = facade.check_all().await;
    assert!(Arc::ptr_eq(&first, &again));

    let mut config = checkout_config();
    config.cash_drawer.enabled = false;
    facade.set_config(config).await.unwrap();

    let after = facade.check_all().await;
    assert!(!Arc::ptr_eq(&first, &after));
    assert_eq!(after.overall, OverallStatus::Partial);
    assert_eq!(printer.connect_attempts(), 0);
}

#[tokio::test]
async fn test_device_test_prints_sample() {
    let printer = MockTransportHandle::new();
    let facade = HardwareFacade::builder(checkout_config())
        .with_transport_factory(printer.factory())
        .build()
        .unwrap();

    let result = facade.test_device(DeviceKind::Printer).await;

    assert!(result.success);
    assert!(!printer.sent_bytes().is_empty());
}
