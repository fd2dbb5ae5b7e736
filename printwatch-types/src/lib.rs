//! Type definitions for printwatch

pub mod error;
pub mod job_state;
pub mod printer;
pub mod snapshot;

pub use error::{Error, Result};
pub use job_state::JobState;
pub use printer::PrinterConfig;
pub use snapshot::{AmsState, AmsTray, AmsUnit, Hardware, Snapshot, Thermal, UNKNOWN_FILE};
