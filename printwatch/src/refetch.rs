//! Deferred notifications
//!
//! Start and finish transitions are first seen on sparse pushes that lack the
//! file name and AMS data. The coordinator asks the printer for a full status
//! push, waits, and then notifies with whatever the store holds at that time.
//!
//! Timers are independent. A second transition inside the delay window gets
//! its own timer; neither is cancelled, and both read the store when they
//! fire.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn, Instrument};

use printwatch_core::constants::DEFAULT_REFETCH_DELAY_MS;
use printwatch_core::{Event, Request, SnapshotStore};
use printwatch_transport::Transport;

use crate::notifier::Notifier;

/// Handle to a scheduled deferred notification
#[derive(Debug)]
pub struct Refetch {
    /// Per-printer schedule counter, starting at 1
    pub generation: u64,
    pub event: Event,
    handle: JoinHandle<()>,
}

impl Refetch {
    /// Wait for the notification to be sent
    pub async fn settled(self) {
        if let Err(e) = self.handle.await {
            warn!("Deferred {} notification task failed: {}", self.event, e);
        }
    }
}

/// Schedules deferred notifications for one printer
pub struct RefetchCoordinator {
    device_id: String,
    delay: Duration,
    store: Arc<SnapshotStore>,
    notifier: Arc<Notifier>,
    generation: AtomicU64,
}

impl RefetchCoordinator {
    pub fn new(device_id: impl Into<String>, store: Arc<SnapshotStore>, notifier: Arc<Notifier>) -> Self {
        Self {
            device_id: device_id.into(),
            delay: Duration::from_millis(DEFAULT_REFETCH_DELAY_MS),
            store,
            notifier,
            generation: AtomicU64::new(0),
        }
    }

    /// Set the wait between the refetch request and the notification
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of notifications scheduled so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Publish `request` and schedule the notification for `event`
    ///
    /// A failed publish is logged; the timer still runs and notifies with
    /// the snapshot as it stands.
    pub async fn schedule(&self, transport: &mut dyn Transport, request: &Request, event: Event) -> Refetch {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        match transport.send(&request.encode()).await {
            Ok(()) => debug!("Sent {} for {}", request, event),
            Err(e) => warn!("Failed to request full status: {}", e),
        }

        let delay = self.delay;
        let device_id = self.device_id.clone();
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);

        let task = async move {
            sleep(delay).await;

            match store.get(&device_id) {
                Some(snapshot) => {
                    debug!("Refetch #{} settled, notifying {}", generation, event);
                    notifier.notify(event, &snapshot).await;
                }
                None => warn!("No snapshot for {} when {} settled", device_id, event),
            }
        };

        Refetch {
            generation,
            event,
            handle: tokio::spawn(task.in_current_span()),
        }
    }
}
