//! Test helpers

use async_trait::async_trait;
use mockall::mock;
use parking_lot::Mutex;
use tokio::time::Instant;

use printwatch_core::{Notification, Report, SnapshotStore};
use printwatch_transport::{NotificationSink, Result};

mock! {
    pub Sink {}

    #[async_trait]
    impl NotificationSink for Sink {
        async fn deliver(&self, notification: &Notification) -> Result<()>;
    }
}

/// Sink that keeps every notification with its delivery time
#[derive(Default)]
pub struct Recorder {
    pub sent: Mutex<Vec<(Instant, Notification)>>,
}

impl Recorder {
    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, n)| n.title.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl NotificationSink for Recorder {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        self.sent.lock().push((Instant::now(), notification.clone()));
        Ok(())
    }
}

pub fn merge(store: &SnapshotStore, device_id: &str, json: &str) {
    store
        .merge(device_id, &Report::decode(json.as_bytes()).unwrap())
        .unwrap();
}
