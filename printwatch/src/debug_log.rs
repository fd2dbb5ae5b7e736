//! Snapshot dumps
//!
//! When enabled, every notification is preceded by a pretty-printed dump of
//! the snapshot it was built from, written to
//! `{dir}/{printer}_{EVENT}_{timestamp}.json`.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use printwatch_core::Event;
use printwatch_types::Snapshot;

use crate::error::Result;

#[derive(Serialize)]
struct Dump<'a> {
    printer: &'a str,
    event: String,
    captured_at: String,
    snapshot: &'a Snapshot,
}

/// Writer for snapshot dumps
#[derive(Debug, Clone)]
pub struct DebugLog {
    dir: PathBuf,
}

impl DebugLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one dump and return its path
    pub async fn save(&self, printer: &str, event: &Event, snapshot: &Snapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let captured_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let file_name = format!(
            "{}_{}_{}.json",
            safe_name(printer),
            event.name(),
            captured_at.replace([':', '.'], "-")
        );
        let path = self.dir.join(file_name);

        let dump = Dump {
            printer,
            event: event.to_string(),
            captured_at,
            snapshot,
        };
        fs::write(&path, serde_json::to_vec_pretty(&dump)?).await?;

        debug!("Saved snapshot dump {}", path.display());
        Ok(path)
    }
}

/// Replace everything but ASCII letters and digits with `_`
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use printwatch_types::JobState;

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("X1 Carbon #2"), "X1_Carbon__2");
        assert_eq!(safe_name("../etc"), "___etc");
        assert_eq!(safe_name("P1S"), "P1S");
    }

    #[tokio::test]
    async fn test_save_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let log = DebugLog::new(dir.path().join("logs"));

        let snapshot = Snapshot {
            job_state: JobState::Running,
            progress_percent: 42,
            ..Snapshot::default()
        };

        let path = log.save("My X1C", &Event::Start, &snapshot).await.unwrap();

        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("My_X1C_START_"));
        assert!(file_name.ends_with(".json"));
        assert!(!file_name.contains(':'));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["printer"], "My X1C");
        assert_eq!(value["event"], "START");
        assert_eq!(value["snapshot"]["progress_percent"], 42);
    }

    #[tokio::test]
    async fn test_save_error_event_tag() {
        let dir = tempfile::tempdir().unwrap();
        let log = DebugLog::new(dir.path());

        let path = log
            .save("A1", &Event::Error { code: 7 }, &Snapshot::default())
            .await
            .unwrap();

        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("A1_ERROR_"));
    }
}
