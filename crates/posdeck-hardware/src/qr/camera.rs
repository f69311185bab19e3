//! Camera capture abstraction used by the QR scan loop.

#![allow(async_fn_in_trait)]

use crate::error::{HardwareError, Result};
use serde::Serialize;
use tracing::warn;

/// Direction a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Rear camera, facing away from the operator.
    Environment,
    /// Front camera.
    User,
    Unknown,
}

/// A camera offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraInfo {
    pub id: String,
    pub label: String,
    pub facing: CameraFacing,
}

impl CameraInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>, facing: CameraFacing) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            facing,
        }
    }
}

/// RGBA frame buffer, reused across decode ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap RGBA pixels. Returns `None` if `data` is not `width * height * 4`
    /// bytes or that size overflows.
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        let expected = width.checked_mul(height)?.checked_mul(4)?;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Build an RGBA buffer from 8-bit luma samples.
    pub fn from_luma(width: usize, height: usize, luma: &[u8]) -> Option<Self> {
        if luma.len() != width.checked_mul(height)? || luma.len() > usize::MAX / 4 {
            return None;
        }
        let data = luma.iter().flat_map(|&l| [l, l, l, 0xFF]).collect();
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Replace the contents with `other`, reusing the allocation.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }

    /// Drop the pixels and release the allocation.
    pub fn clear(&mut self) {
        self.width = 0;
        self.height = 0;
        self.data = Vec::new();
    }

    /// Luma of every pixel (BT.601 weights).
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .map(|px| {
                let y = 299 * u32::from(px[0]) + 587 * u32::from(px[1]) + 114 * u32::from(px[2]);
                (y / 1000) as u8
            })
            .collect()
    }
}

/// An open camera session.
///
/// Methods are synchronous: each decode tick does a bounded amount of work
/// on frames the platform has already delivered.
pub trait CaptureStream: Send + 'static {
    /// A complete frame is available.
    fn frame_ready(&self) -> bool;

    /// Copy the current frame into `buffer`. Returns `false` if there is none.
    fn copy_frame_into(&mut self, buffer: &mut PixelBuffer) -> bool;

    /// Stop capture and release the camera. Idempotent.
    fn release(&mut self);
}

/// Source of camera sessions.
pub trait CameraSource: Send + Sync {
    type Stream: CaptureStream;

    /// Cameras currently offered by the platform.
    fn devices(&self) -> Vec<CameraInfo>;

    /// Request access to `camera` and start capture.
    ///
    /// # Errors
    ///
    /// [`HardwareError::PermissionDenied`] when access is refused,
    /// [`HardwareError::DeviceUnavailable`] when the camera cannot be opened.
    async fn open(&self, camera: &CameraInfo) -> Result<Self::Stream>;
}

/// Pick the camera to open: the configured id, else an environment-facing
/// camera, else the first one.
pub fn select_camera<'a>(
    devices: &'a [CameraInfo],
    preferred: Option<&str>,
) -> Option<&'a CameraInfo> {
    if let Some(id) = preferred {
        if let Some(camera) = devices.iter().find(|camera| camera.id == id) {
            return Some(camera);
        }
        warn!(camera_id = %id, "Configured camera not found, choosing another");
    }

    devices
        .iter()
        .find(|camera| camera.facing == CameraFacing::Environment)
        .or_else(|| devices.first())
}

/// Camera source for platforms without camera capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

/// Stream type of [`NoCamera`]; it cannot be constructed.
#[derive(Debug)]
pub enum NoStream {}

impl CaptureStream for NoStream {
    fn frame_ready(&self) -> bool {
        match *self {}
    }

    fn copy_frame_into(&mut self, _buffer: &mut PixelBuffer) -> bool {
        match *self {}
    }

    fn release(&mut self) {
        match *self {}
    }
}

impl CameraSource for NoCamera {
    type Stream = NoStream;

    fn devices(&self) -> Vec<CameraInfo> {
        Vec::new()
    }

    async fn open(&self, camera: &CameraInfo) -> Result<NoStream> {
        Err(HardwareError::unavailable(
            camera.label.clone(),
            "camera capture is not available on this platform",
        ))
    }
}
