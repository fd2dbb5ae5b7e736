//! In-memory transport
//!
//! Feeds report payloads from a tokio channel instead of a broker. Useful for
//! replaying captured reports and for driving monitors in tests.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::trace;

use crate::{error::*, Transport};

/// Transport side of an in-memory link
pub struct ChannelTransport {
    name: String,
    reports: mpsc::Receiver<Bytes>,
    requests: mpsc::UnboundedSender<Bytes>,
    connected: bool,
}

/// Test / replay side of an in-memory link
pub struct ChannelHandle {
    reports: mpsc::Sender<Bytes>,
    requests: mpsc::UnboundedReceiver<Bytes>,
}

impl ChannelTransport {
    /// Create a linked transport and handle
    ///
    /// `capacity` bounds the number of reports buffered ahead of the monitor.
    pub fn pair(name: impl Into<String>, capacity: usize) -> (Self, ChannelHandle) {
        let (report_tx, report_rx) = mpsc::channel(capacity);
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        let transport = Self {
            name: name.into(),
            reports: report_rx,
            requests: request_tx,
            connected: false,
        };

        let handle = ChannelHandle {
            reports: report_tx,
            requests: request_rx,
        };

        (transport, handle)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }

        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.requests
            .send(Bytes::copy_from_slice(data))
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn receive(&mut self) -> Result<Bytes> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let payload = self.reports.recv().await.ok_or(Error::ConnectionClosed)?;
        trace!("Received {} bytes from {}", payload.len(), self.name);

        Ok(payload)
    }

    fn remote_addr(&self) -> String {
        format!("channel:{}", self.name)
    }
}

impl ChannelHandle {
    /// Push a report payload to the transport
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the transport was dropped.
    pub async fn push(&self, payload: impl Into<Bytes>) -> Result<()> {
        self.reports
            .send(payload.into())
            .await
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Take the next request published by the transport, if any
    pub fn try_request(&mut self) -> Option<Bytes> {
        self.requests.try_recv().ok()
    }

    /// Wait for the next request published by the transport
    pub async fn next_request(&mut self) -> Option<Bytes> {
        self.requests.recv().await
    }

    /// Close the report stream; the transport then reports `ConnectionClosed`
    pub fn close(self) -> mpsc::UnboundedReceiver<Bytes> {
        self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_roundtrip() {
        let (mut transport, mut handle) = ChannelTransport::pair("X1C", 4);
        transport.connect().await.unwrap();

        handle.push(&b"{\"print\":{}}"[..]).await.unwrap();
        let payload = transport.receive().await.unwrap();
        assert_eq!(&payload[..], b"{\"print\":{}}");

        transport.send(b"request").await.unwrap();
        assert_eq!(handle.try_request().as_deref(), Some(&b"request"[..]));
        assert!(handle.try_request().is_none());
    }

    #[tokio::test]
    async fn test_requires_connect() {
        let (mut transport, _handle) = ChannelTransport::pair("X1C", 1);

        assert!(matches!(transport.send(b"x").await, Err(Error::NotConnected)));
        assert!(matches!(transport.receive().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_closed_handle_ends_stream() {
        let (mut transport, handle) = ChannelTransport::pair("X1C", 1);
        transport.connect().await.unwrap();

        let _requests = handle.close();

        assert!(matches!(transport.receive().await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_remote_addr() {
        let (transport, _handle) = ChannelTransport::pair("P1S", 1);
        assert_eq!(transport.remote_addr(), "channel:P1S");
    }
}
