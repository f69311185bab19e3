//! Mock printer transport for testing and development.
//!
//! The transport records every byte it is sent and lets a handle inject
//! connect and send failures, so fallback paths can be exercised without a
//! printer.

use crate::devices::AnyTransport;
use crate::error::{HardwareError, Result};
use crate::printer::TransportFactory;
use crate::transport::PrinterTransport;
use posdeck_core::PrinterTransportConfig;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MockTransportState {
    sent: Vec<u8>,
    send_calls: usize,
    connect_attempts: usize,
    disconnects: usize,
    live_handles: usize,
    max_live_handles: usize,
    fail_connect: Option<String>,
    fail_send_at: Option<usize>,
}

/// Mock printer transport.
///
/// Several transports created from the same handle share one simulated
/// device, which is how the live-handle count detects a second handle being
/// opened before the first was released.
///
/// # Examples
///
/// ```
/// use posdeck_hardware::mock::MockTransport;
/// use posdeck_hardware::transport::PrinterTransport;
///
/// #[tokio::main]
/// async fn main() -> posdeck_hardware::Result<()> {
///     let (mut transport, handle) = MockTransport::new();
///
///     transport.connect().await?;
///     transport.send(&[0x1B, 0x40]).await?;
///     transport.disconnect().await;
///
///     assert_eq!(handle.sent_bytes(), vec![0x1B, 0x40]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    label: String,
    connected: bool,
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    /// Create a mock transport and the handle controlling it.
    pub fn new() -> (Self, MockTransportHandle) {
        let handle = MockTransportHandle::new();
        (handle.transport(), handle)
    }
}

impl PrinterTransport for MockTransport {
    fn device(&self) -> &str {
        &self.label
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }

        let mut state = lock(&self.state);
        state.connect_attempts += 1;

        if let Some(reason) = &state.fail_connect {
            return Err(HardwareError::connect_failed(&self.label, reason.clone()));
        }

        state.live_handles += 1;
        state.max_live_handles = state.max_live_handles.max(state.live_handles);
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(HardwareError::not_connected(&self.label));
        }

        let failed = {
            let mut state = lock(&self.state);
            state.send_calls += 1;
            if state.fail_send_at == Some(state.send_calls) {
                state.live_handles -= 1;
                true
            } else {
                state.sent.extend_from_slice(bytes);
                false
            }
        };

        if failed {
            self.connected = false;
            return Err(HardwareError::send_failed(&self.label, "simulated write failure"));
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            let mut state = lock(&self.state);
            state.live_handles -= 1;
            state.disconnects += 1;
        }
    }
}

/// Handle for controlling and inspecting mock transports.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransportHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockTransportState::default())),
        }
    }

    /// A new transport sharing this handle's simulated device.
    pub fn transport(&self) -> MockTransport {
        MockTransport {
            label: "mock printer".to_string(),
            connected: false,
            state: Arc::clone(&self.state),
        }
    }

    /// Transport factory serving every device-backed printer configuration
    /// with a transport on this handle's simulated device.
    pub fn factory(&self) -> TransportFactory {
        let handle = self.clone();
        Arc::new(move |config: &PrinterTransportConfig| {
            config
                .is_device_backed()
                .then(|| AnyTransport::Mock(handle.transport()))
        })
    }

    /// Make every connect attempt fail with `reason`.
    pub fn fail_connect(&self, reason: impl Into<String>) {
        lock(&self.state).fail_connect = Some(reason.into());
    }

    /// Let connect attempts succeed again.
    pub fn allow_connect(&self) {
        lock(&self.state).fail_connect = None;
    }

    /// Fail the `n`th send call (1-based, counted across transports).
    pub fn fail_send_at(&self, n: usize) {
        lock(&self.state).fail_send_at = Some(n);
    }

    /// Every byte successfully sent so far.
    pub fn sent_bytes(&self) -> Vec<u8> {
        lock(&self.state).sent.clone()
    }

    pub fn send_calls(&self) -> usize {
        lock(&self.state).send_calls
    }

    pub fn connect_attempts(&self) -> usize {
        lock(&self.state).connect_attempts
    }

    pub fn disconnects(&self) -> usize {
        lock(&self.state).disconnects
    }

    /// Handles currently held.
    pub fn live_handles(&self) -> usize {
        lock(&self.state).live_handles
    }

    /// Highest number of handles ever held at once.
    pub fn max_live_handles(&self) -> usize {
        lock(&self.state).max_live_handles
    }
}

impl Default for MockTransportHandle {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(state: &Mutex<MockTransportState>) -> MutexGuard<'_, MockTransportState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_sent_bytes() {
        let (mut transport, handle) = MockTransport::new();

        transport.connect().await.unwrap();
        transport.send(b"abc").await.unwrap();
        transport.send(b"def").await.unwrap();

        assert_eq!(handle.sent_bytes(), b"abcdef".to_vec());
        assert_eq!(handle.send_calls(), 2);
        assert_eq!(handle.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let (mut transport, handle) = MockTransport::new();
        handle.fail_connect("unplugged");

        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, HardwareError::ConnectFailed { .. }));
        assert!(!transport.is_connected());
        assert_eq!(handle.live_handles(), 0);
        assert_eq!(handle.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_drops_handle() {
        let (mut transport, handle) = MockTransport::new();
        handle.fail_send_at(2);

        transport.connect().await.unwrap();
        transport.send(b"one").await.unwrap();
        let err = transport.send(b"two").await.unwrap_err();

        assert!(matches!(err, HardwareError::SendFailed { .. }));
        assert!(!transport.is_connected());
        assert_eq!(handle.sent_bytes(), b"one".to_vec());
        assert_eq!(handle.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_twice() {
        let (mut transport, handle) = MockTransport::new();

        transport.connect().await.unwrap();
        transport.disconnect().await;
        transport.disconnect().await;

        assert_eq!(handle.disconnects(), 1);
        assert_eq!(handle.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_shared_device_counts_handles() {
        let handle = MockTransportHandle::new();
        let mut first = handle.transport();
        let mut second = handle.transport();

        first.connect().await.unwrap();
        second.connect().await.unwrap();

        assert_eq!(handle.max_live_handles(), 2);
    }
}
