//! Notification dispatch for one printer

use std::sync::Arc;

use tracing::{error, info, warn};

use printwatch_core::{Event, NotificationBuilder};
use printwatch_transport::NotificationSink;
use printwatch_types::Snapshot;

use crate::debug_log::DebugLog;

/// Builds and delivers notifications for one printer
///
/// Delivery is best effort: failures are logged and never reach the caller,
/// so a dead webhook cannot stall classification.
pub struct Notifier {
    builder: NotificationBuilder,
    sink: Arc<dyn NotificationSink>,
    debug_log: Option<DebugLog>,
}

impl Notifier {
    pub fn new(builder: NotificationBuilder, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            builder,
            sink,
            debug_log: None,
        }
    }

    /// Dump each notified snapshot to disk first
    pub fn with_debug_log(mut self, debug_log: DebugLog) -> Self {
        self.debug_log = Some(debug_log);
        self
    }

    pub fn device_name(&self) -> &str {
        self.builder.device_name()
    }

    /// Build and deliver the notification for `event`
    ///
    /// Returns whether the sink accepted it.
    pub async fn notify(&self, event: Event, snapshot: &Snapshot) -> bool {
        if let Some(debug_log) = &self.debug_log {
            if let Err(e) = debug_log.save(self.device_name(), &event, snapshot).await {
                warn!("Failed to save snapshot dump: {}", e);
            }
        }

        let notification = self.builder.build(&event, snapshot);

        match self.sink.deliver(&notification).await {
            Ok(()) => {
                info!("Sent {} notification", event.name());
                true
            }
            Err(e) => {
                error!("Failed to send {} notification: {}", event, e);
                false
            }
        }
    }
}
