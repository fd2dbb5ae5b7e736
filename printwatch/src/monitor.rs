//! Per-printer monitor
//!
//! A monitor owns one printer link. Every report goes through the same
//! pipeline: decode, merge into the shared store, classify against the last
//! observation, then notify (immediately for startup and errors, after a
//! full status refetch for job start and finish).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use printwatch_core::{ClassificationState, Event, Report, Sequence, SnapshotStore};
use printwatch_transport::{Error as TransportError, Transport};
use printwatch_types::{PrinterConfig, Snapshot};

use crate::error::Result;
use crate::notifier::Notifier;
use crate::refetch::RefetchCoordinator;

/// Monitor for one printer
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use printwatch::{DeviceMonitor, Notifier};
/// use printwatch_core::{NotificationBuilder, SnapshotStore};
/// use printwatch_transport::{MqttTransport, WebhookSink};
/// use printwatch_types::PrinterConfig;
///
/// #[tokio::main]
/// async fn main() -> printwatch::Result<()> {
///     let printer = PrinterConfig::new("X1C", "192.168.1.50", "00M09A000000000", "12345678");
///     let transport = MqttTransport::new(&printer.host, &printer.serial, &printer.access_code);
///     let sink = WebhookSink::new("https://discord.com/api/webhooks/...")?;
///     let notifier = Notifier::new(NotificationBuilder::new(&printer.name), Arc::new(sink));
///
///     let monitor = DeviceMonitor::new(
///         printer,
///         Box::new(transport),
///         Arc::new(SnapshotStore::new()),
///         Arc::new(notifier),
///     );
///     monitor.run().await
/// }
/// ```
pub struct DeviceMonitor {
    printer: PrinterConfig,
    transport: Box<dyn Transport>,
    store: Arc<SnapshotStore>,
    classifier: ClassificationState,
    notifier: Arc<Notifier>,
    refetch: RefetchCoordinator,
    sequence: Sequence,
}

impl DeviceMonitor {
    pub fn new(
        printer: PrinterConfig,
        transport: Box<dyn Transport>,
        store: Arc<SnapshotStore>,
        notifier: Arc<Notifier>,
    ) -> Self {
        let refetch = RefetchCoordinator::new(&printer.serial, Arc::clone(&store), Arc::clone(&notifier));

        Self {
            printer,
            transport,
            store,
            classifier: ClassificationState::new(),
            notifier,
            refetch,
            sequence: Sequence::new(),
        }
    }

    /// Set the wait before start and finish notifications
    pub fn with_refetch_delay(mut self, delay: Duration) -> Self {
        self.refetch = self.refetch.with_delay(delay);
        self
    }

    pub fn printer(&self) -> &PrinterConfig {
        &self.printer
    }

    pub fn classification(&self) -> &ClassificationState {
        &self.classifier
    }

    /// Current merged snapshot for this printer
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.store.get(&self.printer.serial)
    }

    /// Ask the printer to push its full status
    pub async fn request_full_status(&mut self) -> Result<()> {
        let request = self.sequence.push_all();
        self.transport.send(&request.encode()).await?;

        debug!("Sent {}", request);
        Ok(())
    }

    /// Connect and process reports until the link drops
    ///
    /// A clean close of the report stream ends the monitor with `Ok`. Any
    /// other transport failure is logged and returned.
    pub async fn run(mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.remote_addr());

        if let Err(e) = self.transport.connect().await {
            error!("Connection failed: {}", e);
            return Err(e.into());
        }

        info!("Connected, subscribed to reports for {}", self.printer.serial);

        if let Err(e) = self.request_full_status().await {
            warn!("Initial status request failed: {}", e);
        }

        loop {
            match self.transport.receive().await {
                Ok(payload) => {
                    self.handle_payload(&payload).await;
                }
                Err(TransportError::ConnectionClosed) => {
                    info!("Report stream closed");
                    let _ = self.transport.disconnect().await;
                    return Ok(());
                }
                Err(e) => {
                    error!("Connection failed: {}", e);
                    let _ = self.transport.disconnect().await;
                    return Err(e.into());
                }
            }
        }
    }

    /// Run one report payload through the pipeline
    ///
    /// Returns the events raised, in dispatch order. Payloads that are not
    /// JSON, or carry no job state, are ignored.
    pub async fn handle_payload(&mut self, payload: &[u8]) -> Vec<Event> {
        let report = match Report::decode(payload) {
            Ok(report) => report,
            Err(e) => {
                trace!("Ignoring payload: {}", e);
                return Vec::new();
            }
        };

        let snapshot = match self.store.merge(&self.printer.serial, &report) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                trace!("Ignoring report: {}", e);
                return Vec::new();
            }
        };

        let events = self.classifier.classify(&snapshot);
        for &event in &events {
            self.dispatch(event, &snapshot).await;
        }

        events
    }

    async fn dispatch(&mut self, event: Event, snapshot: &Snapshot) {
        match event {
            Event::Startup => info!("Monitor online, printer is {}", snapshot.job_state),
            Event::Start => info!("Print started, requesting full status..."),
            Event::Finish => info!("Print finished, requesting full status..."),
            Event::Error { code } => warn!("Printer reported error {}", code),
        }

        if event.is_deferred() {
            let request = self.sequence.push_all();
            self.refetch
                .schedule(self.transport.as_mut(), &request, event)
                .await;
        } else {
            self.notifier.notify(event, snapshot).await;
        }
    }
}
