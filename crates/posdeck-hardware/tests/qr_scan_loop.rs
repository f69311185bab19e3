//! Integration tests for the camera QR scan loop.
//!
//! Time is paused so decode ticks happen exactly when the test advances the
//! clock. Camera sessions are counted by the mock camera to check that no
//! session is ever leaked or duplicated.

use posdeck_core::{ScanEvent, ScanSource};
use posdeck_hardware::mock::{MockCameraSource, MockQrDecoder};
use posdeck_hardware::qr::{
    PixelBuffer, QrDecoder, QrScanLoop, RqrrDecoder, ScanLoopState, ScanRequest,
};
use qrcode::{Color, QrCode};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const INTERVAL: Duration = Duration::from_millis(500);

fn request() -> ScanRequest {
    ScanRequest::new(INTERVAL)
}

fn recorder() -> (Arc<Mutex<Vec<ScanEvent>>>, impl Fn(&ScanEvent) + Send + Sync + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event: &ScanEvent| {
        sink.lock().unwrap().push(event.clone());
    })
}

/// Decoder that panics on every frame, taking the session task down with it.
struct FaultyDecoder;

impl QrDecoder for FaultyDecoder {
    fn decode(&self, _frame: &PixelBuffer) -> Option<String> {
        panic!("decoder fault");
    }
}

fn any_frame() -> PixelBuffer {
    PixelBuffer::from_luma(2, 2, &[0, 255, 255, 0]).unwrap()
}

/// Render `payload` as a camera frame with a quiet zone.
fn qr_frame(payload: &str) -> PixelBuffer {
    const SCALE: usize = 6;
    const QUIET: usize = 4;

    let code = QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width();
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET) * SCALE;

    let mut luma = vec![255u8; side * side];
    for y in 0..side {
        for x in 0..side {
            let (mx, my) = (x / SCALE, y / SCALE);
            if mx < QUIET || my < QUIET || mx >= modules + QUIET || my >= modules + QUIET {
                continue;
            }
            if colors[(my - QUIET) * modules + (mx - QUIET)] == Color::Dark {
                luma[y * side + x] = 0;
            }
        }
    }

    PixelBuffer::from_luma(side, side, &luma).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_second_start_joins_running_session() {
    let (camera, handle) = MockCameraSource::new();
    let decoder = MockQrDecoder::new();
    let mut scan_loop = QrScanLoop::new(camera, decoder.clone());
    let (first_events, first) = recorder();
    let (second_events, second) = recorder();

    let first_id = scan_loop.start(request(), first).await.unwrap();
    let second_id = scan_loop.start(request(), second).await.unwrap();

    assert_eq!(first_id, second_id);
    assert_eq!(handle.sessions_opened(), 1);
    assert_eq!(handle.active_sessions(), 1);

    handle.set_frame(any_frame());
    decoder.push_code("ORDER-77");
    tokio::time::sleep(INTERVAL + Duration::from_millis(10)).await;

    assert_eq!(first_events.lock().unwrap().len(), 1);
    assert_eq!(second_events.lock().unwrap().len(), 1);
    scan_loop.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_restart_opens_fresh_session() {
    let (camera, handle) = MockCameraSource::new();
    let mut scan_loop = QrScanLoop::new(camera, MockQrDecoder::new());

    let first = scan_loop.start(request(), |_| {}).await.unwrap();
    scan_loop.stop().await;
    let second = scan_loop.start(request(), |_| {}).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(handle.sessions_opened(), 2);
    assert_eq!(handle.max_active_sessions(), 1);
    scan_loop.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_ticks_without_frame_do_not_decode() {
    let (camera, handle) = MockCameraSource::new();
    let decoder = MockQrDecoder::new();
    let mut scan_loop = QrScanLoop::new(camera, decoder.clone());
    let (events, listener) = recorder();

    scan_loop.start(request(), listener).await.unwrap();
    tokio::time::sleep(INTERVAL * 4).await;

    assert_eq!(decoder.calls(), 0);
    assert_eq!(handle.frames_copied(), 0);
    assert!(events.lock().unwrap().is_empty());
    assert_eq!(scan_loop.state(), ScanLoopState::Running);
    scan_loop.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_decode_miss_keeps_scanning() {
    let (camera, handle) = MockCameraSource::new();
    let decoder = MockQrDecoder::new();
    let mut scan_loop = QrScanLoop::new(camera, decoder.clone());
    let (events, listener) = recorder();
    handle.set_frame(any_frame());
    decoder.push_none();
    decoder.push_none();
    decoder.push_code("TABLE-12");

    scan_loop.start(request(), listener).await.unwrap();
    tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(10)).await;

    let events = events.lock().unwrap().clone();
    assert_eq!(decoder.calls(), 3);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].code, "TABLE-12");
    assert_eq!(events[0].source, ScanSource::Qr);
    scan_loop.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_removes_listeners() {
    let (camera, handle) = MockCameraSource::new();
    let decoder = MockQrDecoder::new();
    let mut scan_loop = QrScanLoop::new(camera, decoder.clone());
    let (events, listener) = recorder();

    scan_loop.start(request(), listener).await.unwrap();
    scan_loop.stop().await;

    handle.set_frame(any_frame());
    decoder.push_code("LATE");
    scan_loop.start(request(), |_| {}).await.unwrap();
    tokio::time::sleep(INTERVAL + Duration::from_millis(10)).await;

    assert!(events.lock().unwrap().is_empty());
    scan_loop.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_loop_releases_camera() {
    let (camera, handle) = MockCameraSource::new();
    let mut scan_loop = QrScanLoop::new(camera, MockQrDecoder::new());
    scan_loop.start(request(), |_| {}).await.unwrap();

    drop(scan_loop);
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(handle.active_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_decodes_rendered_qr_code() {
    let (camera, handle) = MockCameraSource::new();
    let mut scan_loop = QrScanLoop::new(camera, RqrrDecoder);
    let (events, listener) = recorder();
    handle.set_frame(qr_frame("https://pay.example/t/42"));

    scan_loop.start(request(), listener).await.unwrap();
    tokio::time::sleep(INTERVAL + Duration::from_millis(10)).await;
    scan_loop.stop().await;

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].code, "https://pay.example/t/42");
}

#[tokio::test(start_paused = true)]
async fn test_panicking_listener_keeps_session_alive() {
    let (camera, handle) = MockCameraSource::new();
    let decoder = MockQrDecoder::new();
    let mut scan_loop = QrScanLoop::new(camera, decoder.clone());
    let (events, listener) = recorder();
    handle.set_frame(any_frame());
    decoder.push_code("FIRST");
    decoder.push_code("SECOND");

    scan_loop
        .start(request(), |event| {
            if event.code == "FIRST" {
                panic!("listener rejected {}", event.code);
            }
        })
        .await
        .unwrap();
    scan_loop.subscribe(listener);
    tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(10)).await;

    let codes: Vec<String> = events
        .lock()
        .unwrap()
        .iter()
        .map(|event| event.code.clone())
        .collect();
    assert_eq!(codes, vec!["FIRST".to_string(), "SECOND".to_string()]);
    assert_eq!(decoder.calls(), 2);
    assert!(scan_loop.is_running());
    assert_eq!(handle.active_sessions(), 1);
    scan_loop.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_dead_session_task_is_replaced_on_start() {
    let (camera, handle) = MockCameraSource::new();
    let mut scan_loop = QrScanLoop::new(camera, FaultyDecoder);
    handle.set_frame(any_frame());

    let first = scan_loop.start(request(), |_| {}).await.unwrap();
    tokio::time::sleep(INTERVAL + Duration::from_millis(10)).await;

    assert!(!scan_loop.is_running());
    assert_eq!(scan_loop.state(), ScanLoopState::Idle);
    assert!(scan_loop.session_id().is_none());
    assert_eq!(handle.active_sessions(), 0);

    handle.clear_frame();
    let second = scan_loop.start(request(), |_| {}).await.unwrap();

    assert_ne!(first, second);
    assert!(scan_loop.is_running());
    assert_eq!(handle.sessions_opened(), 2);
    assert_eq!(handle.active_sessions(), 1);
    scan_loop.stop().await;
    assert_eq!(handle.active_sessions(), 0);
}
