//! Scripted QR decoder for testing and development.

use crate::qr::camera::PixelBuffer;
use crate::qr::decoder::QrDecoder;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// QR decoder returning queued results, one per decode call.
///
/// Once the queue is empty every frame decodes to nothing. Clones share the
/// queue, so a test keeps a clone to script results after handing the
/// decoder to a scan loop.
///
/// # Examples
///
/// ```
/// use posdeck_hardware::mock::MockQrDecoder;
/// use posdeck_hardware::qr::{PixelBuffer, QrDecoder};
///
/// let decoder = MockQrDecoder::new();
/// decoder.push_none();
/// decoder.push_code("TABLE-7");
///
/// let frame = PixelBuffer::default();
/// assert_eq!(decoder.decode(&frame), None);
/// assert_eq!(decoder.decode(&frame).as_deref(), Some("TABLE-7"));
/// assert_eq!(decoder.calls(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockQrDecoder {
    results: Arc<Mutex<VecDeque<Option<String>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockQrDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful decode.
    pub fn push_code(&self, code: impl Into<String>) {
        self.push(Some(code.into()));
    }

    /// Queue a frame without a readable code.
    pub fn push_none(&self) {
        self.push(None);
    }

    fn push(&self, result: Option<String>) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Number of frames handed to the decoder.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QrDecoder for MockQrDecoder {
    fn decode(&self, _frame: &PixelBuffer) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .flatten()
    }
}
