//! Monitor configuration
//!
//! Settings are read from a JSON file and may be overridden from the
//! environment with the `PRINTWATCH__` prefix and snake_case key names,
//! e.g. `PRINTWATCH__WEBHOOK_URL=https://...` or `PRINTWATCH__SAVE_LOG=true`.
//!
//! ```json
//! {
//!   "webhookUrl": "https://discord.com/api/webhooks/...",
//!   "printers": [
//!     { "name": "X1C", "host": "192.168.1.50", "serial": "00M09A000000000", "accessCode": "12345678" }
//!   ],
//!   "saveLog": false
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Case, Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::Deserialize;

use printwatch_core::constants::{DEFAULT_REFETCH_DELAY_MS, DEFAULT_WEBHOOK_TIMEOUT};
use printwatch_types::PrinterConfig;

use crate::error::{Error, Result};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "PRINTWATCH";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Discord webhook receiving every notification
    pub webhook_url: String,

    /// Printers to monitor
    pub printers: Vec<PrinterConfig>,

    /// Write a snapshot dump for every notification
    #[serde(default)]
    pub save_log: bool,

    /// Directory for snapshot dumps
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Delay between a start/finish transition and its notification
    #[serde(default = "default_refetch_delay_ms")]
    pub refetch_delay_ms: u64,

    /// Webhook request timeout in seconds
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,

    /// Add a layer field to startup and start notifications
    #[serde(default)]
    pub show_layers: bool,
}

/// Override source: `PRINTWATCH__SAVE_LOG` maps to `saveLog`
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .convert_case(Case::Camel)
        .try_parsing(true)
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_refetch_delay_ms() -> u64 {
    DEFAULT_REFETCH_DELAY_MS
}

fn default_webhook_timeout_secs() -> u64 {
    DEFAULT_WEBHOOK_TIMEOUT
}

impl AppConfig {
    /// Load settings from a JSON file plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is missing or malformed, or if
    /// the resulting settings fail [`AppConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let builder = Config::builder().add_source(File::from(path).format(FileFormat::Json));

        Self::build(builder, environment())
    }

    /// Load settings from an in-memory JSON document plus environment overrides
    pub fn from_json(json: &str) -> Result<Self> {
        let builder = Config::builder().add_source(File::from_str(json, FileFormat::Json));

        Self::build(builder, environment())
    }

    fn build(builder: ConfigBuilder<DefaultState>, environment: Environment) -> Result<Self> {
        let settings = builder.add_source(environment).build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.webhook_url.trim().is_empty() {
            return Err(Error::Config("webhookUrl is empty".into()));
        }

        if self.printers.is_empty() {
            return Err(Error::Config("no printers configured".into()));
        }

        for printer in &self.printers {
            printer
                .validate()
                .map_err(|e| Error::Config(e.to_string()))?;
        }

        Ok(())
    }

    pub fn refetch_delay(&self) -> Duration {
        Duration::from_millis(self.refetch_delay_ms)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    /// Snapshot dump directory, if dumps are enabled
    pub fn debug_log_dir(&self) -> Option<&Path> {
        self.save_log.then_some(self.log_dir.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "webhookUrl": "https://discord.test/hook",
        "printers": [
            { "name": "X1C", "host": "10.0.0.5", "serial": "00M09A", "accessCode": "12345678" }
        ]
    }"#;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_json(MINIMAL).unwrap();

        assert_eq!(config.webhook_url, "https://discord.test/hook");
        assert_eq!(config.printers.len(), 1);
        assert_eq!(config.printers[0].access_code, "12345678");
        assert!(!config.save_log);
        assert!(!config.show_layers);
        assert_eq!(config.log_dir, PathBuf::from("./logs"));
        assert_eq!(config.refetch_delay(), Duration::from_millis(2500));
        assert_eq!(config.webhook_timeout(), Duration::from_secs(10));
        assert_eq!(config.debug_log_dir(), None);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "webhookUrl": "https://discord.test/hook",
                "printers": [
                    {{ "name": "A", "host": "10.0.0.5", "serial": "SN-A", "accessCode": "1" }},
                    {{ "name": "B", "host": "10.0.0.6", "serial": "SN-B", "accessCode": "2" }}
                ],
                "saveLog": true,
                "logDir": "/tmp/printwatch",
                "refetchDelayMs": 1000
            }}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.printers[1].serial, "SN-B");
        assert_eq!(config.debug_log_dir(), Some(Path::new("/tmp/printwatch")));
        assert_eq!(config.refetch_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_environment_overrides_file() {
        let vars = [
            ("PRINTWATCH__WEBHOOK_URL", "https://discord.test/other"),
            ("PRINTWATCH__SAVE_LOG", "true"),
            ("PRINTWATCH__REFETCH_DELAY_MS", "500"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let json = MINIMAL.replace(
            r#""printers""#,
            r#""saveLog": false, "refetchDelayMs": 3000, "printers""#,
        );
        let builder = Config::builder().add_source(File::from_str(&json, FileFormat::Json));

        let config = AppConfig::build(builder, environment().source(Some(vars))).unwrap();

        assert_eq!(config.webhook_url, "https://discord.test/other");
        assert!(config.save_log);
        assert_eq!(config.refetch_delay(), Duration::from_millis(500));
        assert_eq!(config.printers[0].access_code, "12345678");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(dir.path().join("absent.json"));

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_no_printers() {
        let json = r#"{ "webhookUrl": "https://discord.test/hook", "printers": [] }"#;

        assert!(matches!(AppConfig::from_json(json), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_printer_without_serial() {
        let json = r#"{
            "webhookUrl": "https://discord.test/hook",
            "printers": [ { "name": "X1C", "host": "10.0.0.5", "serial": "", "accessCode": "1" } ]
        }"#;

        let err = AppConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains("X1C"));
    }

    #[test]
    fn test_rejects_empty_webhook() {
        let json = MINIMAL.replace("https://discord.test/hook", " ");

        assert!(matches!(AppConfig::from_json(&json), Err(Error::Config(_))));
    }
}
