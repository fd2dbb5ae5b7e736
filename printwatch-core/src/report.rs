//! Printer status reports
//!
//! Printers publish JSON objects on `device/{serial}/report`. Status pushes
//! carry a nested `print` object; most pushes are partial and only contain
//! the keys that changed. Other report kinds (`info`, `system`, ...) share the
//! topic and are not status updates.
//!
//! Numeric keys arrive either as JSON numbers or as numeric strings depending
//! on firmware, so every field is decoded leniently:
//!
//! - missing key or `null` → `None` (field absent, prior value kept)
//! - number or numeric string → `Some(value)`
//! - anything else → `Some(0)`

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use printwatch_types::{AmsState, AmsTray, AmsUnit, JobState};

use crate::error::{Error, Result};

/// A decoded report message
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Report {
    /// Status object, present on status pushes only
    #[serde(default)]
    pub print: Option<StatusUpdate>,
}

impl Report {
    /// Decode a raw report payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJson`] if the payload is not a JSON object.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Get the status update carried by this report
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStatusUpdate`] unless the report has a `print`
    /// object with a non-empty `gcode_state`.
    pub fn status(&self) -> Result<&StatusUpdate> {
        match &self.print {
            Some(update) if update.job_state.is_some() => Ok(update),
            _ => Err(Error::NotStatusUpdate),
        }
    }
}

/// Partial status update (`print` object)
///
/// Every field is optional; `None` means the printer did not send it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatusUpdate {
    #[serde(rename = "gcode_state", deserialize_with = "lenient::state")]
    pub job_state: Option<JobState>,

    #[serde(rename = "mc_print_error_code", deserialize_with = "lenient::int")]
    pub error_code: Option<i64>,

    #[serde(rename = "mc_percent", deserialize_with = "lenient::int")]
    pub progress_percent: Option<i64>,

    #[serde(rename = "mc_remaining_time", deserialize_with = "lenient::int")]
    pub remaining_minutes: Option<i64>,

    #[serde(rename = "layer_num", deserialize_with = "lenient::int")]
    pub layer_current: Option<i64>,

    #[serde(rename = "total_layer_num", deserialize_with = "lenient::int")]
    pub layer_total: Option<i64>,

    #[serde(rename = "spd_lvl", deserialize_with = "lenient::int")]
    pub speed_level: Option<i64>,

    #[serde(deserialize_with = "lenient::text")]
    pub subtask_name: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub gcode_file: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub nozzle_diameter: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub nozzle_type: Option<String>,

    #[serde(rename = "print_type", deserialize_with = "lenient::text")]
    pub print_source: Option<String>,

    #[serde(rename = "nozzle_temper", deserialize_with = "lenient::float")]
    pub nozzle_actual: Option<f64>,

    #[serde(rename = "nozzle_target_temper", deserialize_with = "lenient::float")]
    pub nozzle_target: Option<f64>,

    #[serde(rename = "bed_temper", deserialize_with = "lenient::float")]
    pub bed_actual: Option<f64>,

    #[serde(rename = "bed_target_temper", deserialize_with = "lenient::float")]
    pub bed_target: Option<f64>,

    #[serde(deserialize_with = "lenient::ams")]
    pub ams: Option<AmsState>,
}

impl StatusUpdate {
    /// Preferred job file name carried by this update, if any
    ///
    /// `subtask_name` wins over `gcode_file`; empty strings count as missing.
    pub fn file_name(&self) -> Option<&str> {
        non_empty(&self.subtask_name).or_else(|| non_empty(&self.gcode_file))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// Wire shape of the `ams` object
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AmsReport {
    ams: Vec<AmsUnitReport>,
    #[serde(deserialize_with = "lenient::text")]
    tray_now: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AmsUnitReport {
    #[serde(deserialize_with = "lenient::text")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    temp: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    humidity: Option<String>,
    tray: Vec<AmsTrayReport>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AmsTrayReport {
    #[serde(deserialize_with = "lenient::text")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    tray_type: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    tray_color: Option<String>,
}

impl From<AmsReport> for AmsState {
    fn from(report: AmsReport) -> Self {
        Self {
            units: report
                .ams
                .into_iter()
                .enumerate()
                .map(|(index, unit)| AmsUnit {
                    id: unit.id.unwrap_or_else(|| index.to_string()),
                    temperature: unit.temp,
                    humidity: unit.humidity,
                    trays: unit
                        .tray
                        .into_iter()
                        .enumerate()
                        .map(|(slot, tray)| AmsTray {
                            id: tray.id.unwrap_or_else(|| slot.to_string()),
                            tray_type: tray.tray_type,
                            tray_color: tray.tray_color,
                        })
                        .collect(),
                })
                .collect(),
            tray_now: report.tray_now,
        }
    }
}

mod lenient {
    use super::*;

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(|v| to_int(&v)))
    }

    pub fn float<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(|v| to_float(&v)))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }))
    }

    // A blank state carries no information, same as a missing one
    pub fn state<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<JobState>, D::Error> {
        Ok(text(d)?
            .filter(|s| !s.trim().is_empty())
            .map(JobState::from))
    }

    // A malformed `ams` object is treated as absent rather than failing
    // the whole report.
    pub fn ams<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<AmsState>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?
            .and_then(|v| serde_json::from_value::<AmsReport>(v).ok())
            .map(AmsState::from))
    }

    fn to_int(value: &Value) -> Option<i64> {
        match value {
            Value::Null => None,
            Value::Number(n) => Some(n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64)),
            Value::String(s) => {
                let s = s.trim();
                Some(
                    s.parse::<i64>()
                        .ok()
                        .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                        .unwrap_or(0),
                )
            }
            _ => Some(0),
        }
    }

    fn to_float(value: &Value) -> Option<f64> {
        match value {
            Value::Null => None,
            Value::Number(n) => Some(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => Some(s.trim().parse::<f64>().unwrap_or(0.0)),
            _ => Some(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_status_push() {
        let payload = br#"{"print":{"gcode_state":"RUNNING","mc_percent":40,"mc_remaining_time":30,"command":"push_status"}}"#;
        let report = Report::decode(payload).unwrap();
        let status = report.status().unwrap();

        assert_eq!(status.job_state, Some(JobState::Running));
        assert_eq!(status.progress_percent, Some(40));
        assert_eq!(status.remaining_minutes, Some(30));
        assert_eq!(status.error_code, None);
    }

    #[test]
    fn test_report_without_print_is_not_status() {
        let report = Report::decode(br#"{"info":{"command":"get_version"}}"#).unwrap();
        assert!(matches!(report.status(), Err(Error::NotStatusUpdate)));
    }

    #[test]
    fn test_print_without_state_is_not_status() {
        let report = Report::decode(br#"{"print":{"mc_percent":12}}"#).unwrap();
        assert!(matches!(report.status(), Err(Error::NotStatusUpdate)));
    }

    #[test]
    fn test_blank_state_is_not_status() {
        for payload in [&br#"{"print":{"gcode_state":""}}"#[..], &br#"{"print":{"gcode_state":"  ","mc_percent":5}}"#[..]] {
            let report = Report::decode(payload).unwrap();
            assert!(matches!(report.status(), Err(Error::NotStatusUpdate)));
        }
    }

    #[test]
    fn test_invalid_json() {
        let result = Report::decode(b"not json");
        assert!(matches!(result, Err(Error::InvalidJson(_))));
    }

    #[test]
    fn test_numeric_strings() {
        let payload = br#"{"print":{"gcode_state":"IDLE","mc_print_error_code":"50348044","nozzle_temper":"219.5","spd_lvl":2.0}}"#;
        let report = Report::decode(payload).unwrap();
        let status = report.status().unwrap();

        assert_eq!(status.error_code, Some(50348044));
        assert_eq!(status.nozzle_actual, Some(219.5));
        assert_eq!(status.speed_level, Some(2));
    }

    #[test]
    fn test_malformed_numeric_is_zero() {
        let payload = br#"{"print":{"gcode_state":"IDLE","mc_percent":"n/a","bed_temper":[1],"layer_num":null}}"#;
        let report = Report::decode(payload).unwrap();
        let status = report.status().unwrap();

        assert_eq!(status.progress_percent, Some(0));
        assert_eq!(status.bed_actual, Some(0.0));
        assert_eq!(status.layer_current, None);
    }

    #[test]
    fn test_file_name_preference() {
        let update = StatusUpdate {
            subtask_name: Some(String::new()),
            gcode_file: Some("/data/Metadata/plate_1.gcode".into()),
            ..Default::default()
        };
        assert_eq!(update.file_name(), Some("/data/Metadata/plate_1.gcode"));

        let update = StatusUpdate {
            subtask_name: Some("benchy".into()),
            gcode_file: Some("plate_1.gcode".into()),
            ..Default::default()
        };
        assert_eq!(update.file_name(), Some("benchy"));
    }

    #[test]
    fn test_decode_ams() {
        let payload = br#"{"print":{"gcode_state":"RUNNING","ams":{"ams":[{"id":"0","temp":"25.3","humidity":"4","tray":[{"id":"0","tray_type":"PLA","tray_color":"FF0000FF"},{"id":"1"}]}],"tray_now":"0"}}}"#;
        let report = Report::decode(payload).unwrap();
        let ams = report.status().unwrap().ams.clone().unwrap();

        assert_eq!(ams.tray_now.as_deref(), Some("0"));
        assert_eq!(ams.units.len(), 1);
        assert_eq!(ams.units[0].temperature.as_deref(), Some("25.3"));
        assert_eq!(ams.units[0].trays[0].tray_type.as_deref(), Some("PLA"));
        assert!(ams.units[0].trays[1].is_empty());
    }

    #[test]
    fn test_malformed_ams_is_absent() {
        let payload = br#"{"print":{"gcode_state":"RUNNING","ams":{"ams":"broken"}}}"#;
        let report = Report::decode(payload).unwrap();

        assert_eq!(report.status().unwrap().ams, None);
    }
}
