//! Notification payloads
//!
//! Builds Discord-compatible embeds from a snapshot. Building never fails:
//! missing values render as `?`, `N/A` or `0`.

use chrono::{DateTime, Duration, Local, SecondsFormat, Utc};
use serde::Serialize;

use printwatch_types::{JobState, Snapshot};

use crate::classifier::Event;
use crate::constants::{colors, FOOTER_TEXT};

/// Body shown when the printer reports no AMS
pub const NO_AMS: &str = "No AMS Detected";

/// A notification ready for delivery (one embed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub footer: Footer,
    /// Generation time, RFC 3339 UTC
    pub timestamp: String,
}

impl Notification {
    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One embed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Footer {
    pub text: String,
}

/// Field names
pub mod names {
    pub const FILE: &str = "📂 Filename";
    pub const PROGRESS: &str = "⏳ Progress";
    pub const LAYER: &str = "🥞 Layer / Speed";
    pub const STATUS: &str = "📊 Status";
    pub const HARDWARE: &str = "⚙️ Hardware";
    pub const THERMALS: &str = "🌡️ Thermals";
    pub const AMS: &str = "📦 AMS System";
    pub const FINAL_STATUS: &str = "⏱️ Final Status";
}

/// Builds notifications for one printer
///
/// # Examples
///
/// ```
/// use printwatch_core::{Event, NotificationBuilder};
/// use printwatch_types::Snapshot;
///
/// let builder = NotificationBuilder::new("X1C");
/// let notification = builder.build(&Event::Startup, &Snapshot::default());
///
/// assert_eq!(notification.title, "🔵 System Online: X1C");
/// ```
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    device_name: String,
    show_layers: bool,
}

impl NotificationBuilder {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            show_layers: false,
        }
    }

    /// Add the layer / speed field to STARTUP and START notifications
    pub fn with_layers(mut self, show_layers: bool) -> Self {
        self.show_layers = show_layers;
        self
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Build a notification stamped with the current time
    pub fn build(&self, event: &Event, snapshot: &Snapshot) -> Notification {
        self.build_at(event, snapshot, Local::now())
    }

    /// Build a notification as if generated at `now`
    pub fn build_at(&self, event: &Event, snapshot: &Snapshot, now: DateTime<Local>) -> Notification {
        let name = &self.device_name;
        let file = Field::new(names::FILE, format!("`{}`", snapshot.file_name), false);
        let progress = Field::new(names::PROGRESS, progress_text(snapshot, now), true);
        let layer = Field::new(names::LAYER, layer_text(snapshot), true);

        let (title, color, description, mut fields) = match event {
            Event::Startup => (
                format!("🔵 System Online: {}", name),
                colors::STARTUP,
                None,
                vec![
                    Field::new(names::STATUS, format!("**{}**", snapshot.job_state), true),
                    progress,
                    Field::new(names::HARDWARE, hardware_text(snapshot), true),
                    ams_field(snapshot),
                ],
            ),
            Event::Start => (
                format!("🟡 Print Started: {}", name),
                colors::START,
                Some("New job initiated.".to_string()),
                vec![
                    file,
                    progress,
                    Field::new(names::HARDWARE, hardware_text(snapshot), true),
                    Field::new(names::THERMALS, thermal_text(snapshot), true),
                    ams_field(snapshot),
                ],
            ),
            Event::Finish => (
                format!("🟢 Print Completed: {}", name),
                colors::FINISH,
                Some("Job finished successfully.".to_string()),
                vec![
                    file,
                    Field::new(names::FINAL_STATUS, "✅ COMPLETED (100%)", true),
                    Field::new(names::THERMALS, thermal_text(snapshot), true),
                    ams_field(snapshot),
                ],
            ),
            Event::Error { code } => (
                format!("🔴 Critical Error: {}", name),
                colors::ERROR,
                Some(format!(
                    "**Please check the printer immediately.**\nError code: {}",
                    error_code_text(*code)
                )),
                vec![file, progress],
            ),
        };

        if self.show_layers && matches!(event, Event::Startup | Event::Start) {
            if let Some(index) = fields.iter().position(|f| f.name == names::PROGRESS) {
                fields.insert(index + 1, layer);
            }
        }

        Notification {
            title,
            color,
            description,
            fields,
            footer: Footer {
                text: FOOTER_TEXT.to_string(),
            },
            timestamp: now.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Progress percentage with ETA or job state
pub fn progress_text(snapshot: &Snapshot, now: DateTime<Local>) -> String {
    let mut text = format!("**{}%**", snapshot.progress_percent);

    if snapshot.job_state == JobState::Running {
        let eta = Some(snapshot.remaining_minutes)
            .filter(|minutes| *minutes > 0)
            .and_then(Duration::try_minutes)
            .and_then(|remaining| now.checked_add_signed(remaining));

        match eta {
            Some(eta) => text.push_str(&format!(" (ETA: {})", eta.format("%H:%M"))),
            None => text.push_str(" (Calc...)"),
        }
    } else {
        text.push_str(&format!(" ({})", snapshot.job_state));
    }

    text
}

/// Current / total layers and speed level
pub fn layer_text(snapshot: &Snapshot) -> String {
    let speed = match snapshot.speed_level {
        0 => "N/A".to_string(),
        level => format!("Lvl {}", level),
    };

    format!("{} / {}\n{}", snapshot.layer_current, snapshot.layer_total, speed)
}

/// Nozzle description, plus job source while a job is loaded
pub fn hardware_text(snapshot: &Snapshot) -> String {
    let hardware = &snapshot.hardware;
    let mut text = format!(
        "Nozzle: {}mm ({})",
        hardware.nozzle_diameter.as_deref().unwrap_or("?"),
        hardware.nozzle_type.as_deref().unwrap_or("?")
    );

    if snapshot.job_state.is_active() {
        text.push_str(&format!(
            "\nSrc: {}",
            hardware.print_source.as_deref().unwrap_or("N/A")
        ));
    }

    text
}

/// Actual / target temperatures
pub fn thermal_text(snapshot: &Snapshot) -> String {
    let t = &snapshot.thermal;
    format!(
        "**Noz:** {}°C / {}°C\n**Bed:** {}°C / {}°C",
        t.nozzle_actual, t.nozzle_target, t.bed_actual, t.bed_target
    )
}

/// AMS field for the first AMS unit
pub fn ams_field(snapshot: &Snapshot) -> Field {
    let mut title = names::AMS.to_string();
    let mut body = NO_AMS.to_string();

    let Some(ams) = &snapshot.ams else {
        return Field::new(title, body, false);
    };
    let Some(unit) = ams.units.first() else {
        return Field::new(title, body, false);
    };

    if let Some(temp) = unit.temperature.as_deref().filter(|t| !t.is_empty()) {
        title.push_str(&format!(
            " (Temp: {}°C | Hum: Lvl {})",
            temp,
            unit.humidity.as_deref().unwrap_or("?")
        ));
    }

    if !unit.trays.is_empty() {
        body = unit
            .trays
            .iter()
            .enumerate()
            .map(|(index, tray)| {
                let slot = index + 1;
                let Some(kind) = tray.tray_type.as_deref().filter(|_| !tray.is_empty()) else {
                    return format!("`S{}` Empty", slot);
                };

                let color = tray
                    .tray_color
                    .as_deref()
                    .map(|c| format!("#{}", c.chars().take(6).collect::<String>()))
                    .unwrap_or_else(|| "N/A".to_string());
                let active = if ams.tray_now.as_deref() == Some(tray.id.as_str()) {
                    " ◀ **IN USE**"
                } else {
                    ""
                };

                format!("`S{}` **{}** [{}]{}", slot, kind, color, active)
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    Field::new(title, body, false)
}

/// Error code in decimal and in the `XXXX-XXXX` form printed in Bambu's wiki
pub fn error_code_text(code: i64) -> String {
    match u32::try_from(code) {
        Ok(raw) => {
            let hex = hex::encode_upper(raw.to_be_bytes());
            format!("{} (`{}-{}`)", code, &hex[..4], &hex[4..])
        }
        Err(_) => code.to_string(),
    }
}
