//! Protocol and presentation constants

/// Printer MQTT broker port (TLS)
pub const DEFAULT_MQTT_PORT: u16 = 8883;

/// MQTT user name for LAN access
pub const MQTT_USERNAME: &str = "bblp";

/// Default MQTT connection timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Default delay between a START/FINISH edge and its notification (milliseconds)
pub const DEFAULT_REFETCH_DELAY_MS: u64 = 2500;

/// Default webhook request timeout (seconds)
pub const DEFAULT_WEBHOOK_TIMEOUT: u64 = 10;

/// Footer attached to every notification
pub const FOOTER_TEXT: &str = "Bambu Lab Discord Monitor";

/// MQTT topics
pub mod topics {
    /// Topic the printer publishes status reports on
    pub fn report(serial: &str) -> String {
        format!("device/{}/report", serial)
    }
    
    /// Topic the printer accepts requests on
    pub fn request(serial: &str) -> String {
        format!("device/{}/request", serial)
    }
}

/// Embed colours (decimal RGB)
pub mod colors {
    pub const STARTUP: u32 = 3447003;
    pub const START: u32 = 16776960;
    pub const FINISH: u32 = 5763719;
    pub const ERROR: u32 = 15158332;
}
