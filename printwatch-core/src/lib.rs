//! # printwatch-core
//!
//! Core state tracking for Bambu Lab printers.
//!
//! This crate holds the pure, I/O-free parts of the monitor:
//! - Report decoding (printer JSON pushes)
//! - Snapshot merging per printer
//! - Job transition classification
//! - Notification payload building
//! - Outbound request encoding

pub mod classifier;
pub mod command;
pub mod constants;
pub mod error;
pub mod notification;
pub mod report;
pub mod store;

pub use classifier::{ClassificationState, Event};
pub use command::{Command, Request, Sequence};
pub use error::{Error, Result};
pub use notification::{Notification, NotificationBuilder};
pub use report::{Report, StatusUpdate};
pub use store::SnapshotStore;
