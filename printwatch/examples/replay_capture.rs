//! Replay captured report payloads (one JSON object per line) through a monitor
//!
//! ```text
//! cargo run --example replay_capture -- capture.jsonl
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use printwatch::{DeviceMonitor, Notification, NotificationBuilder, Notifier, PrinterConfig, SnapshotStore};
use printwatch_transport::{ChannelTransport, NotificationSink, Transport};

struct Stdout;

#[async_trait]
impl NotificationSink for Stdout {
    async fn deliver(&self, notification: &Notification) -> printwatch_transport::Result<()> {
        println!("{}", serde_json::to_string_pretty(notification).unwrap_or_default());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "capture.jsonl".to_string());
    let capture = tokio::fs::read_to_string(&path).await?;

    let (mut transport, mut handle) = ChannelTransport::pair("replay", 64);
    transport.connect().await?;

    let printer = PrinterConfig::new("Replay", "localhost", "REPLAY", "");
    let notifier = Notifier::new(NotificationBuilder::new(&printer.name), Arc::new(Stdout));
    let mut monitor = DeviceMonitor::new(printer, Box::new(transport), Arc::new(SnapshotStore::new()), Arc::new(notifier))
        .with_refetch_delay(Duration::from_millis(200));

    for line in capture.lines().filter(|l| !l.trim().is_empty()) {
        let events = monitor.handle_payload(line.as_bytes()).await;
        if !events.is_empty() {
            println!("events: {:?}", events);
        }
    }

    // Let deferred notifications fire
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut requests = 0;
    while handle.try_request().is_some() {
        requests += 1;
    }
    println!("{} full status request(s) published", requests);

    Ok(())
}
