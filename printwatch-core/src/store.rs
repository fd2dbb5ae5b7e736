//! Per-printer snapshot store
//!
//! Holds one merged [`Snapshot`] per device serial. The store is shared
//! (behind an `Arc`) between a printer's monitor task and its pending
//! refetch timers; entries for different printers never interact.
//!
//! Merging is field-granular: keys missing from an update keep their prior
//! value. Two fields have their own rules:
//! - `ams` is replaced wholesale when present, kept otherwise
//! - `file_name` takes `subtask_name`, then `gcode_file`, then keeps the
//!   previous name

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

use printwatch_types::Snapshot;

use crate::error::Result;
use crate::report::{Report, StatusUpdate};

/// Snapshot store keyed by device serial
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: RwLock<HashMap<String, Snapshot>>,
}

impl SnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a report into the device's snapshot
    ///
    /// Creates the snapshot on the first status update for `device_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotStatusUpdate`] if the report carries no
    /// job state. Nothing is merged in that case.
    pub fn merge(&self, device_id: &str, report: &Report) -> Result<Snapshot> {
        let update = report.status()?;

        let mut snapshots = self.snapshots.write();
        let snapshot = snapshots.entry(device_id.to_string()).or_default();
        apply(snapshot, update);

        trace!(device_id, state = %snapshot.job_state, "merged status update");

        Ok(snapshot.clone())
    }

    /// Get the current snapshot for a device
    pub fn get(&self, device_id: &str) -> Option<Snapshot> {
        self.snapshots.read().get(device_id).cloned()
    }

    /// Check if a device has reported any status yet
    pub fn contains(&self, device_id: &str) -> bool {
        self.snapshots.read().contains_key(device_id)
    }

    /// Number of devices with a snapshot
    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

fn assign<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn assign_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *target = value.clone();
    }
}

/// Apply a partial update on top of a snapshot
pub fn apply(snapshot: &mut Snapshot, update: &StatusUpdate) {
    assign(&mut snapshot.job_state, &update.job_state);
    assign(&mut snapshot.error_code, &update.error_code);
    assign(&mut snapshot.progress_percent, &update.progress_percent);
    assign(&mut snapshot.remaining_minutes, &update.remaining_minutes);
    assign(&mut snapshot.layer_current, &update.layer_current);
    assign(&mut snapshot.layer_total, &update.layer_total);
    assign(&mut snapshot.speed_level, &update.speed_level);

    if let Some(name) = update.file_name() {
        snapshot.file_name = name.to_string();
    }

    let hardware = &mut snapshot.hardware;
    assign_opt(&mut hardware.nozzle_diameter, &update.nozzle_diameter);
    assign_opt(&mut hardware.nozzle_type, &update.nozzle_type);
    assign_opt(&mut hardware.print_source, &update.print_source);

    let thermal = &mut snapshot.thermal;
    assign(&mut thermal.nozzle_actual, &update.nozzle_actual);
    assign(&mut thermal.nozzle_target, &update.nozzle_target);
    assign(&mut thermal.bed_actual, &update.bed_actual);
    assign(&mut thermal.bed_target, &update.bed_target);

    assign_opt(&mut snapshot.ams, &update.ams);
}
