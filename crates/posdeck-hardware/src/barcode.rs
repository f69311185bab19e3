//! Keyboard-wedge barcode scan reconstruction.
//!
//! A wedge scanner types its code as a burst of ordinary keystrokes followed
//! by Enter. The decoder buffers printable characters and starts over
//! whenever the gap since the previous character exceeds the threshold, so
//! only a burst faster than human typing survives until the terminator. The
//! terminator itself must also arrive within the threshold: Enter pressed
//! after a pause is a human confirming their input and is forwarded.
//!
//! Timing cannot tell a scanner from a person who types one character and
//! presses Enter within the threshold. That keystroke pair is reported as a
//! one-character scan.
//!
//! Characters are always forwarded to the focused input. Only the Enter that
//! completes a scan is consumed.

use posdeck_core::{ScanEvent, ScannerConfig};
use std::time::{Duration, Instant};
use tracing::debug;

/// Key carried by a [`KeyEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    /// Any other key (arrows, function keys, Tab, ...).
    Other,
}

/// Modifier keys held during a keystroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// A timestamped keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub at: Instant,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers, at: Instant) -> Self {
        Self { key, modifiers, at }
    }

    /// Unmodified character keystroke.
    pub fn char(c: char, at: Instant) -> Self {
        Self::new(Key::Char(c), Modifiers::NONE, at)
    }

    /// Enter keystroke.
    pub fn enter(at: Instant) -> Self {
        Self::new(Key::Enter, Modifiers::NONE, at)
    }
}

/// What the caller should do with a keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Deliver the keystroke to the application as usual.
    Forward,
    /// The keystroke completed a scan and must not be delivered.
    Consumed(ScanEvent),
}

impl KeyDisposition {
    pub fn scan(&self) -> Option<&ScanEvent> {
        match self {
            Self::Consumed(event) => Some(event),
            Self::Forward => None,
        }
    }
}

/// Reconstructs barcode scans from keystrokes.
///
/// # Examples
///
/// ```
/// use posdeck_core::ScannerConfig;
/// use posdeck_hardware::barcode::{BarcodeInputDecoder, KeyEvent};
/// use std::time::{Duration, Instant};
///
/// let mut decoder = BarcodeInputDecoder::new(&ScannerConfig { enabled: true, threshold_ms: 100 });
/// let t0 = Instant::now();
/// let ms = Duration::from_millis;
///
/// decoder.handle(&KeyEvent::char('4', t0));
/// decoder.handle(&KeyEvent::char('2', t0 + ms(8)));
/// let done = decoder.handle(&KeyEvent::enter(t0 + ms(16)));
///
/// assert_eq!(done.scan().unwrap().code, "42");
/// ```
#[derive(Debug, Clone)]
pub struct BarcodeInputDecoder {
    enabled: bool,
    threshold: Duration,
    buffer: String,
    last_char_at: Option<Instant>,
}

impl BarcodeInputDecoder {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            enabled: config.enabled,
            threshold: Duration::from_millis(config.threshold_ms),
            buffer: String::new(),
            last_char_at: None,
        }
    }

    /// Apply a new scanner configuration, discarding any partial scan.
    pub fn configure(&mut self, config: &ScannerConfig) {
        self.enabled = config.enabled;
        self.threshold = Duration::from_millis(config.threshold_ms);
        self.reset();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Characters buffered for the scan in progress.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_char_at = None;
    }

    /// Feed one keystroke.
    pub fn handle(&mut self, event: &KeyEvent) -> KeyDisposition {
        if !self.enabled {
            return KeyDisposition::Forward;
        }

        match event.key {
            Key::Char(c) => {
                if event.modifiers.any() || c.is_control() {
                    return KeyDisposition::Forward;
                }
                if let Some(last) = self.last_char_at
                    && event.at.saturating_duration_since(last) > self.threshold
                {
                    self.buffer.clear();
                }
                self.buffer.push(c);
                self.last_char_at = Some(event.at);
                KeyDisposition::Forward
            }
            Key::Enter => {
                let stale = self
                    .last_char_at
                    .is_some_and(|last| event.at.saturating_duration_since(last) > self.threshold);
                let code = self.buffer.trim().to_string();
                self.reset();
                if code.is_empty() || stale {
                    KeyDisposition::Forward
                } else {
                    debug!(code = %code, "Barcode scan recognised");
                    KeyDisposition::Consumed(ScanEvent::barcode(code))
                }
            }
            Key::Other => KeyDisposition::Forward,
        }
    }
}
