//! # printwatch
//!
//! Job notifications for Bambu Lab 3D printers.
//!
//! Each configured printer gets a monitor that listens to the printer's MQTT
//! status pushes, merges them into a snapshot, and posts a Discord embed when
//! the monitor comes online, a job starts, a job finishes, or an error code
//! appears.
//!
//! ## Quick Start
//!
//! ```no_run
//! use printwatch::{AppConfig, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> printwatch::Result<()> {
//!     let config = AppConfig::load("config.json")?;
//!
//!     let mut supervisor = Supervisor::start(&config)?;
//!     supervisor.wait().await;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod debug_log;
pub mod error;
pub mod monitor;
pub mod notifier;
pub mod refetch;
pub mod supervisor;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::AppConfig;
pub use debug_log::DebugLog;
pub use error::{Error, Result};
pub use monitor::DeviceMonitor;
pub use notifier::Notifier;
pub use refetch::{Refetch, RefetchCoordinator};
pub use supervisor::Supervisor;

// Re-export types
pub use printwatch_core::{Event, Notification, NotificationBuilder, SnapshotStore};
pub use printwatch_types::{JobState, PrinterConfig, Snapshot};
