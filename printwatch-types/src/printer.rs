//! Printer connection settings

use std::fmt;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One monitored printer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterConfig {
    /// Display name used in notifications
    pub name: String,

    /// Printer IP address or host name
    pub host: String,

    /// Printer serial number (device identity)
    pub serial: String,

    /// LAN access code shown on the printer screen
    pub access_code: String,
}

impl PrinterConfig {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        serial: impl Into<String>,
        access_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            serial: serial.into(),
            access_code: access_code.into(),
        }
    }

    /// Check that the fields needed to connect are present
    pub fn validate(&self) -> Result<()> {
        if self.serial.trim().is_empty() {
            return Err(Error::Validation(format!(
                "printer '{}' has no serial number",
                self.name
            )));
        }

        if self.host.trim().is_empty() {
            return Err(Error::Validation(format!(
                "printer '{}' has no host",
                self.name
            )));
        }

        Ok(())
    }
}

impl fmt::Display for PrinterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Printer[{} SN: {} @ {}]", self.name, self.serial, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"name":"X1C","host":"10.0.0.5","serial":"00M09A","accessCode":"12345678"}"#;
        let printer: PrinterConfig = serde_json::from_str(json).unwrap();

        assert_eq!(printer, PrinterConfig::new("X1C", "10.0.0.5", "00M09A", "12345678"));
        assert!(printer.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_serial() {
        let printer = PrinterConfig::new("P1S", "10.0.0.6", " ", "code");
        assert!(matches!(printer.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_display() {
        let printer = PrinterConfig::new("A1", "10.0.0.7", "SN1", "code");
        assert_eq!(printer.to_string(), "Printer[A1 SN: SN1 @ 10.0.0.7]");
    }
}
