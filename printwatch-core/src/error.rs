//! Error types for printwatch-core

/// Result type alias for printwatch-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding and merging printer reports
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Payload is not valid JSON or has an unexpected shape
    #[error("Invalid report payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    
    /// Report carries no `print.gcode_state`
    #[error("Report is not a status update")]
    NotStatusUpdate,
}

