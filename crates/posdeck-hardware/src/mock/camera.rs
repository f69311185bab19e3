//! Mock camera source for testing and development.
//!
//! Frames are injected through [`MockCameraHandle`]; the handle also counts
//! open sessions so tests can check that no camera is left running.

use crate::error::{HardwareError, Result};
use crate::qr::camera::{CameraFacing, CameraInfo, CameraSource, CaptureStream, PixelBuffer};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct CameraState {
    devices: Vec<CameraInfo>,
    denied: Option<String>,
    frame: Option<PixelBuffer>,
    sessions_opened: usize,
    active_sessions: usize,
    max_active_sessions: usize,
    frames_copied: usize,
    last_opened: Option<String>,
}

/// Mock camera source.
///
/// Offers a single environment-facing camera by default.
///
/// # Examples
///
/// ```
/// use posdeck_hardware::mock::MockCameraSource;
/// use posdeck_hardware::qr::camera::CameraSource;
///
/// let (camera, handle) = MockCameraSource::new();
/// assert_eq!(camera.devices().len(), 1);
/// assert_eq!(handle.active_sessions(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockCameraSource {
    state: Arc<Mutex<CameraState>>,
}

impl MockCameraSource {
    pub fn new() -> (Self, MockCameraHandle) {
        let state = Arc::new(Mutex::new(CameraState {
            devices: vec![CameraInfo::new(
                "mock-rear",
                "Mock Rear Camera",
                CameraFacing::Environment,
            )],
            denied: None,
            frame: None,
            sessions_opened: 0,
            active_sessions: 0,
            max_active_sessions: 0,
            frames_copied: 0,
            last_opened: None,
        }));

        (
            Self {
                state: Arc::clone(&state),
            },
            MockCameraHandle { state },
        )
    }
}

impl CameraSource for MockCameraSource {
    type Stream = MockCaptureStream;

    fn devices(&self) -> Vec<CameraInfo> {
        lock(&self.state).devices.clone()
    }

    async fn open(&self, camera: &CameraInfo) -> Result<MockCaptureStream> {
        let mut state = lock(&self.state);

        if let Some(reason) = &state.denied {
            return Err(HardwareError::permission_denied(&camera.label, reason.clone()));
        }
        if !state.devices.iter().any(|d| d.id == camera.id) {
            return Err(HardwareError::unavailable(&camera.label, "camera disconnected"));
        }

        state.sessions_opened += 1;
        state.active_sessions += 1;
        state.max_active_sessions = state.max_active_sessions.max(state.active_sessions);
        state.last_opened = Some(camera.id.clone());

        Ok(MockCaptureStream {
            state: Arc::clone(&self.state),
            released: false,
        })
    }
}

/// Capture session opened by [`MockCameraSource`]. Released on drop.
#[derive(Debug)]
pub struct MockCaptureStream {
    state: Arc<Mutex<CameraState>>,
    released: bool,
}

impl CaptureStream for MockCaptureStream {
    fn frame_ready(&self) -> bool {
        !self.released && lock(&self.state).frame.is_some()
    }

    fn copy_frame_into(&mut self, buffer: &mut PixelBuffer) -> bool {
        if self.released {
            return false;
        }
        let mut state = lock(&self.state);
        let Some(frame) = &state.frame else {
            return false;
        };
        buffer.copy_from(frame);
        state.frames_copied += 1;
        true
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            lock(&self.state).active_sessions -= 1;
        }
    }
}

impl Drop for MockCaptureStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Handle for controlling a mock camera source.
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    state: Arc<Mutex<CameraState>>,
}

impl MockCameraHandle {
    /// Replace the list of offered cameras.
    pub fn set_devices(&self, devices: Vec<CameraInfo>) {
        lock(&self.state).devices = devices;
    }

    /// Refuse camera access with `reason`.
    pub fn deny_access(&self, reason: impl Into<String>) {
        lock(&self.state).denied = Some(reason.into());
    }

    /// Set the frame every open session currently sees.
    pub fn set_frame(&self, frame: PixelBuffer) {
        lock(&self.state).frame = Some(frame);
    }

    /// Remove the current frame, as before the first frame arrives.
    pub fn clear_frame(&self) {
        lock(&self.state).frame = None;
    }

    pub fn sessions_opened(&self) -> usize {
        lock(&self.state).sessions_opened
    }

    /// Sessions opened and not yet released.
    pub fn active_sessions(&self) -> usize {
        lock(&self.state).active_sessions
    }

    pub fn max_active_sessions(&self) -> usize {
        lock(&self.state).max_active_sessions
    }

    /// Frames copied out by decode ticks.
    pub fn frames_copied(&self) -> usize {
        lock(&self.state).frames_copied
    }

    /// Id of the most recently opened camera.
    pub fn last_opened(&self) -> Option<String> {
        lock(&self.state).last_opened.clone()
    }
}

fn lock(state: &Mutex<CameraState>) -> MutexGuard<'_, CameraState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_and_drop_releases() {
        let (camera, handle) = MockCameraSource::new();
        let info = camera.devices().remove(0);

        let stream = camera.open(&info).await.unwrap();
        assert_eq!(handle.active_sessions(), 1);

        drop(stream);
        assert_eq!(handle.active_sessions(), 0);
        assert_eq!(handle.sessions_opened(), 1);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (camera, handle) = MockCameraSource::new();
        let info = camera.devices().remove(0);

        let mut stream = camera.open(&info).await.unwrap();
        stream.release();
        stream.release();
        drop(stream);

        assert_eq!(handle.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_frames() {
        let (camera, handle) = MockCameraSource::new();
        let info = camera.devices().remove(0);
        let mut stream = camera.open(&info).await.unwrap();
        let mut buffer = PixelBuffer::default();

        assert!(!stream.frame_ready());
        assert!(!stream.copy_frame_into(&mut buffer));

        handle.set_frame(PixelBuffer::from_luma(1, 1, &[7]).unwrap());
        assert!(stream.frame_ready());
        assert!(stream.copy_frame_into(&mut buffer));
        assert_eq!(buffer.to_luma(), vec![7]);
        assert_eq!(handle.frames_copied(), 1);
    }
}
