//! Periodic camera capture and QR decode loop.
//!
//! ```text
//! idle ──start──> starting ──camera opened──> running ──stop──> stopping ──> idle
//!                     │
//!                     └── no camera / access refused ──> idle (error)
//! ```
//!
//! While running, a spawned task wakes every scan interval, copies the
//! current frame into a reused buffer and tries to decode it. Ticks without
//! a frame or without a code do nothing. The task owns the capture stream
//! and releases it on exit, panics included, so [`QrScanLoop::stop`]
//! returns only after the camera is free. A session whose task died is
//! reported as idle and replaced by the next [`QrScanLoop::start`].

use super::camera::{CameraSource, CaptureStream, PixelBuffer, select_camera};
use super::decoder::QrDecoder;
use crate::error::{HardwareError, Result};
use crate::listeners::{ListenerId, ListenerRegistry};
use posdeck_core::ScanEvent;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Lifecycle state of a [`QrScanLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanLoopState {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// Identifier of one capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters of a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Camera to open; otherwise an environment-facing camera is preferred.
    pub camera_id: Option<String>,
    /// Period of the decode tick.
    pub interval: Duration,
}

impl ScanRequest {
    pub fn new(interval: Duration) -> Self {
        Self {
            camera_id: None,
            interval,
        }
    }

    pub fn with_camera(mut self, camera_id: impl Into<String>) -> Self {
        self.camera_id = Some(camera_id.into());
        self
    }
}

struct Session {
    id: SessionId,
    camera_id: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Session {
    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Releases the capture stream however the session task ends.
struct StreamGuard<S: CaptureStream>(S);

impl<S: CaptureStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Camera QR scanner with a single capture session at a time.
pub struct QrScanLoop<C: CameraSource, D: QrDecoder> {
    camera: C,
    decoder: Arc<D>,
    listeners: ListenerRegistry<ScanEvent>,
    state: ScanLoopState,
    session: Option<Session>,
}

impl<C: CameraSource, D: QrDecoder> QrScanLoop<C, D> {
    pub fn new(camera: C, decoder: D) -> Self {
        Self {
            camera,
            decoder: Arc::new(decoder),
            listeners: ListenerRegistry::new(),
            state: ScanLoopState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> ScanLoopState {
        if self.session.as_ref().is_some_and(Session::is_finished) {
            ScanLoopState::Idle
        } else {
            self.state
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ScanLoopState::Running
    }

    /// Id of the live session, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session
            .as_ref()
            .filter(|session| !session.is_finished())
            .map(|session| session.id)
    }

    /// Camera source, for enumerating devices.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Register an additional listener for decoded payloads.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ScanEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Open a camera and start decoding.
    ///
    /// If a session is already running no camera is opened: `on_scan` joins
    /// the existing session and its id is returned.
    ///
    /// # Errors
    ///
    /// Fails, leaving the loop idle, when no camera is offered or the camera
    /// cannot be opened.
    pub async fn start<F>(&mut self, request: ScanRequest, on_scan: F) -> Result<SessionId>
    where
        F: Fn(&ScanEvent) + Send + Sync + 'static,
    {
        self.reap_finished();

        if let Some(session) = &self.session {
            debug!(session = %session.id, "QR scan already running");
            self.listeners.subscribe(on_scan);
            return Ok(session.id);
        }

        if request.interval.is_zero() {
            return Err(HardwareError::unsupported("QR scan with zero interval"));
        }

        self.state = ScanLoopState::Starting;

        let devices = self.camera.devices();
        let Some(camera) = select_camera(&devices, request.camera_id.as_deref()).cloned() else {
            self.state = ScanLoopState::Idle;
            warn!("QR scan not started: no camera available");
            return Err(HardwareError::unavailable("qr-reader", "no camera available"));
        };

        let stream = match self.camera.open(&camera).await {
            Ok(stream) => stream,
            Err(e) => {
                self.state = ScanLoopState::Idle;
                warn!(camera = %camera.id, "QR scan not started: {}", e);
                return Err(e);
            }
        };

        self.listeners.subscribe(on_scan);

        let id = SessionId(Uuid::new_v4());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_session(
            stream,
            Arc::clone(&self.decoder),
            self.listeners.clone(),
            request.interval,
            cancel.clone(),
        ));

        info!(
            session = %id,
            camera = %camera.id,
            interval_ms = request.interval.as_millis() as u64,
            "QR scan started"
        );

        self.session = Some(Session {
            id,
            camera_id: camera.id,
            cancel,
            task,
        });
        self.state = ScanLoopState::Running;
        Ok(id)
    }

    /// Stop decoding, release the camera and remove every listener.
    ///
    /// Safe to call when idle.
    pub async fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            self.state = ScanLoopState::Stopping;
            session.cancel.cancel();

            if let Err(e) = session.task.await {
                warn!(session = %session.id, "QR scan task ended abnormally: {}", e);
            }

            info!(session = %session.id, camera = %session.camera_id, "QR scan stopped");
        }

        self.listeners.clear();
        self.state = ScanLoopState::Idle;
    }

    /// Forget a session whose task is gone and drop its listeners.
    fn reap_finished(&mut self) {
        if let Some(session) = self.session.take_if(|session| session.is_finished()) {
            warn!(
                session = %session.id,
                camera = %session.camera_id,
                "QR scan task ended unexpectedly"
            );
            self.listeners.clear();
            self.state = ScanLoopState::Idle;
        }
    }
}

impl<C: CameraSource, D: QrDecoder> Drop for QrScanLoop<C, D> {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

impl<C: CameraSource, D: QrDecoder> fmt::Debug for QrScanLoop<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrScanLoop")
            .field("state", &self.state)
            .field("session", &self.session_id())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

async fn run_session<S: CaptureStream, D: QrDecoder>(
    stream: S,
    decoder: Arc<D>,
    listeners: ListenerRegistry<ScanEvent>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut stream = StreamGuard(stream);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut buffer = PixelBuffer::default();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if !stream.0.frame_ready() || !stream.0.copy_frame_into(&mut buffer) {
                    trace!("QR tick skipped: no frame");
                    continue;
                }
                if let Some(code) = decoder.decode(&buffer) {
                    debug!(code = %code, "QR code decoded");
                    listeners.emit(&ScanEvent::qr(code));
                }
            }
        }
    }

    buffer.clear();
}
