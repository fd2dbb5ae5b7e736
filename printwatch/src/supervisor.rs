//! Runs one monitor task per printer

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, info_span, Instrument};

use printwatch_core::{NotificationBuilder, SnapshotStore};
use printwatch_transport::{MqttTransport, NotificationSink, WebhookSink};

use crate::config::AppConfig;
use crate::debug_log::DebugLog;
use crate::error::Result;
use crate::monitor::DeviceMonitor;
use crate::notifier::Notifier;

/// Owner of all monitor tasks and the shared snapshot store
///
/// Monitors are independent: one printer failing to connect or dropping its
/// link does not affect the others.
pub struct Supervisor {
    store: Arc<SnapshotStore>,
    monitors: JoinSet<(String, Result<()>)>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self {
            store: Arc::new(SnapshotStore::new()),
            monitors: JoinSet::new(),
        }
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build MQTT monitors for every configured printer and start them
    ///
    /// All printers share one webhook client.
    pub fn start(config: &AppConfig) -> Result<Self> {
        let sink: Arc<dyn NotificationSink> =
            Arc::new(WebhookSink::with_timeout(&config.webhook_url, config.webhook_timeout())?);

        let mut supervisor = Self::new();

        for printer in &config.printers {
            let mut notifier = Notifier::new(
                NotificationBuilder::new(&printer.name).with_layers(config.show_layers),
                Arc::clone(&sink),
            );
            if let Some(dir) = config.debug_log_dir() {
                notifier = notifier.with_debug_log(DebugLog::new(dir));
            }

            let transport = MqttTransport::new(&printer.host, &printer.serial, &printer.access_code);

            let monitor = DeviceMonitor::new(
                printer.clone(),
                Box::new(transport),
                supervisor.store(),
                Arc::new(notifier),
            )
            .with_refetch_delay(config.refetch_delay());

            supervisor.spawn(monitor);
        }

        info!("Monitoring {} printer(s)", supervisor.len());
        Ok(supervisor)
    }

    /// Shared snapshot store
    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Start a monitor task
    pub fn spawn(&mut self, monitor: DeviceMonitor) {
        let name = monitor.printer().name.clone();
        let span = info_span!("printer", name = %name);

        self.monitors.spawn(
            async move {
                let result = monitor.run().await;
                (name, result)
            }
            .instrument(span),
        );
    }

    /// Number of monitors still running
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Wait for every monitor to end
    pub async fn wait(&mut self) {
        while let Some(joined) = self.monitors.join_next().await {
            match joined {
                Ok((name, Ok(()))) => info!("Monitor for {} stopped", name),
                Ok((name, Err(e))) => error!("Monitor for {} stopped: {}", name, e),
                Err(e) => error!("Monitor task failed: {}", e),
            }
        }
    }

    /// Abort all monitors
    pub async fn shutdown(&mut self) {
        self.monitors.shutdown().await;
    }
}
