//! Watch a single printer and print notifications instead of posting them

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use printwatch::{DeviceMonitor, Notification, NotificationBuilder, Notifier, PrinterConfig, SnapshotStore};
use printwatch_transport::{MqttTransport, NotificationSink};

struct Stdout;

#[async_trait]
impl NotificationSink for Stdout {
    async fn deliver(&self, notification: &Notification) -> printwatch_transport::Result<()> {
        println!("━━ {}", notification.title);
        for field in &notification.fields {
            println!("   {}: {}", field.name, field.value.replace('\n', " | "));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> printwatch::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Change to your printer
    let host = std::env::var("PRINTER_HOST").unwrap_or_else(|_| "192.168.1.50".to_string());
    let serial = std::env::var("PRINTER_SERIAL").unwrap_or_else(|_| "00M09A000000000".to_string());
    let code = std::env::var("PRINTER_ACCESS_CODE").unwrap_or_else(|_| "12345678".to_string());

    println!("Watching {} ({})...", host, serial);

    let printer = PrinterConfig::new("Printer", host, serial, code);
    let transport = MqttTransport::new(&printer.host, &printer.serial, &printer.access_code)
        .with_connect_timeout(Duration::from_secs(5));
    let notifier = Notifier::new(NotificationBuilder::new(&printer.name).with_layers(true), Arc::new(Stdout));

    let monitor = DeviceMonitor::new(printer, Box::new(transport), Arc::new(SnapshotStore::new()), Arc::new(notifier));

    monitor.run().await
}
