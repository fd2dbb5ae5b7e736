//! Transport layer for printwatch
//!
//! Provides the printer link (MQTT, or an in-memory channel) and the
//! notification sink (webhook).

pub mod channel;
pub mod error;
pub mod mqtt;
pub mod webhook;

pub use channel::{ChannelHandle, ChannelTransport};
pub use error::{Error, Result};
pub use mqtt::MqttTransport;
pub use webhook::WebhookSink;

use async_trait::async_trait;
use bytes::Bytes;

use printwatch_core::Notification;

/// Transport trait for printer links
///
/// Only `Send`: a transport is owned by the single task driving it.
#[async_trait]
pub trait Transport: Send {
    /// Connect to the printer and subscribe to its reports
    async fn connect(&mut self) -> Result<()>;
    
    /// Disconnect from the printer
    async fn disconnect(&mut self) -> Result<()>;
    
    /// Check if connected
    fn is_connected(&self) -> bool;
    
    /// Publish raw bytes on the printer's request topic
    async fn send(&mut self, data: &[u8]) -> Result<()>;
    
    /// Receive the next report payload
    async fn receive(&mut self) -> Result<Bytes>;
    
    /// Get remote address
    fn remote_addr(&self) -> String;
}

/// Destination for built notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}
