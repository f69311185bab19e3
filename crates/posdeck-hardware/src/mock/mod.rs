//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware. The CLI uses them
//! for its `--simulate` mode.

pub mod camera;
pub mod decoder;
pub mod transport;

// Re-export commonly used types
pub use camera::{MockCameraHandle, MockCameraSource, MockCaptureStream};
pub use decoder::MockQrDecoder;
pub use transport::{MockTransport, MockTransportHandle};
