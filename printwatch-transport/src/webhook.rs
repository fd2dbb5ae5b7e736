//! Webhook notification sink
//!
//! Posts each notification as a single Discord embed:
//!
//! ```text
//! POST <webhook url>
//! {"embeds": [ { "title": ..., "color": ..., "fields": [...], ... } ]}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use printwatch_core::constants::DEFAULT_WEBHOOK_TIMEOUT;
use printwatch_core::Notification;

use crate::{error::*, NotificationSink};

/// Request body for a webhook post
#[derive(Debug, Serialize)]
pub struct WebhookBody<'a> {
    pub embeds: [&'a Notification; 1],
}

impl<'a> WebhookBody<'a> {
    pub fn new(notification: &'a Notification) -> Self {
        Self {
            embeds: [notification],
        }
    }
}

/// Sink posting notifications to a webhook URL
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    /// Create a sink with the default request timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT))
    }

    /// Create a sink with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookBody::new(notification))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        debug!("Webhook accepted '{}' ({})", notification.title, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printwatch_core::{Event, NotificationBuilder};
    use printwatch_types::Snapshot;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn notification() -> Notification {
        NotificationBuilder::new("X1C").build(&Event::Startup, &Snapshot::default())
    }

    // Accept one request, reply with `status_line`, return the request body
    async fn serve_once(listener: TcpListener, status_line: &'static str) -> String {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let body_start = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert_ne!(n, 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buf[..body_start]).to_lowercase();
        let length: usize = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);

        while buf.len() < body_start + length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert_ne!(n, 0, "client closed before sending body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
        stream.write_all(response.as_bytes()).await.unwrap();

        String::from_utf8_lossy(&buf[body_start..body_start + length]).into_owned()
    }

    #[test]
    fn test_body_shape() {
        let notification = notification();
        let value = serde_json::to_value(WebhookBody::new(&notification)).unwrap();

        assert_eq!(value["embeds"].as_array().unwrap().len(), 1);
        assert_eq!(value["embeds"][0]["title"], "🔵 System Online: X1C");
    }

    #[tokio::test]
    async fn test_deliver_posts_embed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener, "HTTP/1.1 204 No Content"));

        let sink = WebhookSink::new(format!("http://{}/hook", addr)).unwrap();
        sink.deliver(&notification()).await.unwrap();

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body["embeds"][0]["footer"]["text"], "Bambu Lab Discord Monitor");
    }

    #[tokio::test]
    async fn test_deliver_error_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener, "HTTP/1.1 500 Internal Server Error"));

        let sink = WebhookSink::new(format!("http://{}/hook", addr)).unwrap();
        let result = sink.deliver(&notification()).await;

        assert!(matches!(result, Err(Error::Status(500))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_deliver_unreachable() {
        let sink = WebhookSink::with_timeout("http://127.0.0.1:9/hook", Duration::from_millis(500)).unwrap();

        assert!(sink.deliver(&notification()).await.is_err());
    }
}
