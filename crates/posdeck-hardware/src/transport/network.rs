//! Raw TCP printer transport (port 9100 by default).

use super::PrinterTransport;
use crate::error::{HardwareError, Result};
use posdeck_core::constants::{DEVICE_WRITE_TIMEOUT_MS, NETWORK_CONNECT_TIMEOUT_MS};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

/// Network printer reached over a plain TCP connection.
///
/// The whole receipt travels as a fire-and-forget byte stream; the printer
/// sends no acknowledgement.
#[derive(Debug)]
pub struct NetworkTransport {
    host: String,
    port: u16,
    label: String,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl NetworkTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            label: format!("network {host}:{port}"),
            host,
            port,
            stream: None,
            connect_timeout: Duration::from_millis(NETWORK_CONNECT_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEVICE_WRITE_TIMEOUT_MS),
        }
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl PrinterTransport for NetworkTransport {
    fn device(&self) -> &str {
        &self.label
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        info!(device = %self.label, "Connecting to network printer");

        let connect = TcpStream::connect((self.host.as_str(), self.port));
        let stream = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!(device = %self.label, "Connection failed: {}", e);
                return Err(HardwareError::connect_failed(&self.label, e.to_string()));
            }
            Err(_) => {
                let ms = self.connect_timeout.as_millis() as u64;
                warn!(device = %self.label, "Connection timeout after {}ms", ms);
                return Err(HardwareError::connect_failed(
                    &self.label,
                    format!("timed out after {ms}ms"),
                ));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        self.stream = Some(stream);
        info!(device = %self.label, "Network printer connected");
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| HardwareError::not_connected(&self.label))?;

        let write = async {
            stream.write_all(bytes).await?;
            stream.flush().await
        };

        let outcome = match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("write timed out after {}ms", self.write_timeout.as_millis())),
        };

        outcome.map_err(|reason| {
            error!(device = %self.label, "Failed to write to printer: {}", reason);
            self.stream = None;
            HardwareError::send_failed(&self.label, reason)
        })
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            info!(device = %self.label, "Network printer disconnected");
        }
    }
}

/// Check whether `host:port` accepts a TCP connection within `timeout`.
///
/// The connection is closed immediately; nothing is written.
pub async fn probe_reachable(host: &str, port: u16, timeout: Duration) -> Result<()> {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(HardwareError::connect_failed(
            format!("network {host}:{port}"),
            e.to_string(),
        )),
        Err(_) => Err(HardwareError::timeout(timeout.as_millis() as u64)),
    }
}
