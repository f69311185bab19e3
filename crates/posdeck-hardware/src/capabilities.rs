//! Platform capability signals.
//!
//! The status aggregator never asks the operating system directly whether a
//! USB stack or a camera exists. It reads a [`PlatformCapabilities`] value
//! supplied at construction, so status rules can be tested against any
//! combination of capabilities.

/// What the host platform can do, independent of configuration.
pub trait PlatformCapabilities: Send + Sync {
    /// USB device access is available.
    fn usb_supported(&self) -> bool;

    /// Serial port access is available.
    fn serial_supported(&self) -> bool;

    /// Camera capture is available.
    fn camera_supported(&self) -> bool;

    /// The display reports touch input.
    fn touch_supported(&self) -> bool;
}

/// Fixed capability set.
///
/// # Examples
///
/// ```
/// use posdeck_hardware::capabilities::{CapabilitySet, PlatformCapabilities};
///
/// let caps = CapabilitySet::none().with_camera(true);
/// assert!(caps.camera_supported());
/// assert!(!caps.usb_supported());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pub usb: bool,
    pub serial: bool,
    pub camera: bool,
    pub touch: bool,
}

impl CapabilitySet {
    pub const fn none() -> Self {
        Self {
            usb: false,
            serial: false,
            camera: false,
            touch: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            usb: true,
            serial: true,
            camera: true,
            touch: true,
        }
    }

    pub const fn with_usb(mut self, usb: bool) -> Self {
        self.usb = usb;
        self
    }

    pub const fn with_serial(mut self, serial: bool) -> Self {
        self.serial = serial;
        self
    }

    pub const fn with_camera(mut self, camera: bool) -> Self {
        self.camera = camera;
        self
    }

    pub const fn with_touch(mut self, touch: bool) -> Self {
        self.touch = touch;
        self
    }
}

impl PlatformCapabilities for CapabilitySet {
    fn usb_supported(&self) -> bool {
        self.usb
    }

    fn serial_supported(&self) -> bool {
        self.serial
    }

    fn camera_supported(&self) -> bool {
        self.camera
    }

    fn touch_supported(&self) -> bool {
        self.touch
    }
}

/// Capabilities of the running binary.
///
/// USB and serial support follow the compiled-in transport features. Camera
/// and touch presence cannot be detected portably, so the embedding
/// application reports them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCapabilities {
    camera: bool,
    touch: bool,
}

impl NativeCapabilities {
    pub fn new(camera: bool, touch: bool) -> Self {
        Self { camera, touch }
    }
}

impl PlatformCapabilities for NativeCapabilities {
    fn usb_supported(&self) -> bool {
        cfg!(feature = "hardware-usb")
    }

    fn serial_supported(&self) -> bool {
        cfg!(feature = "hardware-serial")
    }

    fn camera_supported(&self) -> bool {
        self.camera
    }

    fn touch_supported(&self) -> bool {
        self.touch
    }
}
