//! Merged telemetry snapshot for one printer
//!
//! A snapshot is never built from a single message. Printers push partial
//! status objects, and each one is merged on top of the previous snapshot
//! (see `printwatch_core::store`). Numeric fields default to zero.

use serde::Serialize;

use crate::JobState;

/// Placeholder shown until a real file name has been reported
pub const UNKNOWN_FILE: &str = "Unknown File";

/// Current merged state of one printer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Job state (`gcode_state`)
    pub job_state: JobState,

    /// Print error code, 0 when healthy (`mc_print_error_code`)
    pub error_code: i64,

    /// Job progress in percent (`mc_percent`)
    pub progress_percent: i64,

    /// Estimated remaining time in minutes (`mc_remaining_time`)
    pub remaining_minutes: i64,

    /// Current layer (`layer_num`)
    pub layer_current: i64,

    /// Total layers (`total_layer_num`)
    pub layer_total: i64,

    /// Speed profile level (`spd_lvl`), 0 when unknown
    pub speed_level: i64,

    /// Job file name
    pub file_name: String,

    /// Nozzle and job source information
    pub hardware: Hardware,

    /// Nozzle and bed temperatures
    pub thermal: Thermal,

    /// Automatic material system state, if the printer has reported one
    pub ams: Option<AmsState>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            job_state: JobState::Unknown,
            error_code: 0,
            progress_percent: 0,
            remaining_minutes: 0,
            layer_current: 0,
            layer_total: 0,
            speed_level: 0,
            file_name: UNKNOWN_FILE.to_string(),
            hardware: Hardware::default(),
            thermal: Thermal::default(),
            ams: None,
        }
    }
}

impl Snapshot {
    /// Check if a real file name has been observed
    pub fn has_file_name(&self) -> bool {
        self.file_name != UNKNOWN_FILE
    }
}

/// Hardware description fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hardware {
    /// Nozzle diameter in millimetres, as reported (e.g. `"0.4"`)
    pub nozzle_diameter: Option<String>,

    /// Nozzle material (e.g. `"hardened_steel"`)
    pub nozzle_type: Option<String>,

    /// Where the current job came from (`print_type`, e.g. `"cloud"`)
    pub print_source: Option<String>,
}

/// Temperatures in degrees Celsius
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Thermal {
    pub nozzle_actual: f64,
    pub nozzle_target: f64,
    pub bed_actual: f64,
    pub bed_target: f64,
}

/// Automatic material system (AMS) state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmsState {
    /// Attached AMS units in reported order
    pub units: Vec<AmsUnit>,

    /// Id of the tray currently feeding the printer
    pub tray_now: Option<String>,
}

/// One AMS unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmsUnit {
    pub id: String,

    /// Ambient temperature inside the unit
    pub temperature: Option<String>,

    /// Humidity level (device scale, not percent)
    pub humidity: Option<String>,

    /// Tray slots in index order
    pub trays: Vec<AmsTray>,
}

/// One AMS tray slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmsTray {
    pub id: String,

    /// Filament type (e.g. `"PLA"`), `None` when the slot is empty
    pub tray_type: Option<String>,

    /// Filament colour as `RRGGBBAA` hex
    pub tray_color: Option<String>,
}

impl AmsTray {
    /// Check if the slot holds no filament
    pub fn is_empty(&self) -> bool {
        self.tray_type.as_deref().is_none_or(str::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.job_state, JobState::Unknown);
        assert_eq!(snapshot.error_code, 0);
        assert_eq!(snapshot.file_name, UNKNOWN_FILE);
        assert!(!snapshot.has_file_name());
        assert!(snapshot.ams.is_none());
    }

    #[test]
    fn test_tray_is_empty() {
        let empty = AmsTray {
            id: "0".into(),
            tray_type: Some(String::new()),
            tray_color: None,
        };
        assert!(empty.is_empty());

        let loaded = AmsTray {
            id: "1".into(),
            tray_type: Some("PLA".into()),
            tray_color: Some("FF0000FF".into()),
        };
        assert!(!loaded.is_empty());
    }
}
