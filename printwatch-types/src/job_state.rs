//! Print job state as reported by the printer (`gcode_state`)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Job state reported in the `gcode_state` field.
///
/// States the monitor does not know about are kept verbatim in
/// [`JobState::Other`] so they can still be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    /// No state reported yet
    #[default]
    Unknown,

    /// Printer is idle
    Idle,

    /// Preparing a job (heating, calibration)
    Prepare,

    /// Job is printing
    Running,

    /// Job is paused
    Pause,

    /// Job finished
    Finish,

    /// Job failed or was cancelled
    Failed,

    /// Any other device-reported state
    Other(String),
}

impl JobState {
    /// Parse a device-reported state string
    pub fn parse(raw: &str) -> Self {
        match raw {
            "UNKNOWN" => Self::Unknown,
            "IDLE" => Self::Idle,
            "PREPARE" => Self::Prepare,
            "RUNNING" => Self::Running,
            "PAUSE" => Self::Pause,
            "FINISH" => Self::Finish,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Device spelling of this state
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Idle => "IDLE",
            Self::Prepare => "PREPARE",
            Self::Running => "RUNNING",
            Self::Pause => "PAUSE",
            Self::Finish => "FINISH",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }

    /// Check if a job is actively printing
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if a job is loaded on the printer (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Pause)
    }
}

impl From<String> for JobState {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> String {
        state.as_str().to_string()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_states() {
        assert_eq!(JobState::parse("RUNNING"), JobState::Running);
        assert_eq!(JobState::parse("FINISH"), JobState::Finish);
        assert_eq!(JobState::parse("IDLE"), JobState::Idle);
    }

    #[test]
    fn test_unknown_state_passes_through() {
        let state = JobState::parse("SLICING");
        assert_eq!(state, JobState::Other("SLICING".into()));
        assert_eq!(state.to_string(), "SLICING");
    }

    #[test]
    fn test_is_active() {
        assert!(JobState::Running.is_active());
        assert!(JobState::Pause.is_active());
        assert!(!JobState::Finish.is_active());
        assert!(!JobState::Pause.is_running());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&JobState::Pause).unwrap();
        assert_eq!(json, "\"PAUSE\"");

        let state: JobState = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(state, JobState::Running);
    }
}
