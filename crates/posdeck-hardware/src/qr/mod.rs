//! Camera-based QR code scanning.

pub mod camera;
pub mod decoder;
pub mod scan_loop;

pub use camera::{
    CameraFacing, CameraInfo, CameraSource, CaptureStream, NoCamera, PixelBuffer, select_camera,
};
pub use decoder::{QrDecoder, RqrrDecoder};
pub use scan_loop::{QrScanLoop, ScanLoopState, ScanRequest, SessionId};
