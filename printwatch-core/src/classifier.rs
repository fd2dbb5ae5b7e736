//! Job transition classification
//!
//! Each merged snapshot is compared against what the monitor saw last for the
//! same printer. Start and finish are edge-triggered: they fire on the
//! transition into `RUNNING` / out of `RUNNING` into `FINISH`, never while a
//! state is sustained. Error onset fires once per distinct non-zero code and is
//! re-armed when the printer reports code 0 again.

use std::fmt;

use printwatch_types::{JobState, Snapshot};

/// Notable printer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// First status seen for the printer since the monitor started
    Startup,

    /// A job started printing
    Start,

    /// A new error code was reported
    Error { code: i64 },

    /// A running job finished
    Finish,
}

impl Event {
    /// Event tag used in logs and debug file names
    pub fn name(self) -> &'static str {
        match self {
            Self::Startup => "STARTUP",
            Self::Start => "START",
            Self::Error { .. } => "ERROR",
            Self::Finish => "FINISH",
        }
    }

    /// Check if the notification should wait for a settled snapshot
    ///
    /// The push that flips the job state often lacks the file name and AMS
    /// data, so start and finish are reported after a full status refetch.
    pub fn is_deferred(self) -> bool {
        matches!(self, Self::Start | Self::Finish)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { code } => write!(f, "{}({})", self.name(), code),
            _ => f.write_str(self.name()),
        }
    }
}

/// Per-printer classification memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationState {
    /// Job state seen on the previous status update (`None` before the first)
    pub last_job_state: Option<JobState>,

    /// Last error code announced, 0 when re-armed
    pub last_error_code: i64,

    /// True until the first status update has been classified
    pub first_observation: bool,
}

impl Default for ClassificationState {
    fn default() -> Self {
        Self {
            last_job_state: None,
            last_error_code: 0,
            first_observation: true,
        }
    }
}

impl ClassificationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a merged snapshot and update the state
    ///
    /// Returns events in the order they should be dispatched. The first
    /// snapshot only ever yields [`Event::Startup`].
    pub fn classify(&mut self, snapshot: &Snapshot) -> Vec<Event> {
        let current = &snapshot.job_state;
        let error_code = snapshot.error_code;

        if self.first_observation {
            self.first_observation = false;
            self.last_job_state = Some(current.clone());
            self.last_error_code = error_code;
            return vec![Event::Startup];
        }

        let mut events = Vec::new();
        let was_running = self.last_job_state.as_ref().is_some_and(JobState::is_running);

        if !was_running && current.is_running() {
            events.push(Event::Start);
        }

        if error_code != 0 && error_code != self.last_error_code {
            events.push(Event::Error { code: error_code });
            self.last_error_code = error_code;
        } else if error_code == 0 {
            self.last_error_code = 0;
        }

        if was_running && *current == JobState::Finish {
            events.push(Event::Finish);
        }

        self.last_job_state = Some(current.clone());

        events
    }
}
